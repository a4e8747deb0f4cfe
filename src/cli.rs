use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mcp-bootstrap")]
#[command(version)]
#[command(about = "Register project MCP servers with the host CLI")]
pub struct Cli {
    /// Enable debug diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register every configured MCP server with the host CLI
    Setup(SetupArgs),
    /// Run the PostgreSQL MCP server with DATABASE_URL from .env
    Launch(LaunchArgs),
    /// Show the servers `setup` would register
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long = "project-root", value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Print the host CLI invocations without running them
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Exit with status 2 if any registration failed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Standalone launcher binary (`mcp-postgres`).
#[derive(Parser, Debug)]
#[command(name = "mcp-postgres")]
#[command(version)]
#[command(about = "Run the PostgreSQL MCP server with DATABASE_URL from .env")]
pub struct LauncherCli {
    /// Enable debug diagnostics on stderr
    #[arg(long)]
    pub verbose: bool,
    #[command(flatten)]
    pub project: ProjectArgs,
}
