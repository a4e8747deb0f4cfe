use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{ListArgs, SetupArgs};
use crate::config::Configuration;
use crate::descriptor::{self, ServiceDescriptor, Transport};
use crate::error::BootstrapError;
use crate::registrar::{self, DryRun, HostCli, RegistrationSummary, Registry};

/// Exit status for `setup --strict` when at least one registration failed.
pub const PARTIAL_FAILURE_EXIT: i32 = 2;

pub fn run(args: &SetupArgs) -> Result<i32> {
    let config = Configuration::load(args.project.project_root.as_deref())?;
    let descriptors = descriptor::resolve(&config, &launcher_exe()?)?;

    println!("🚀 Setting up MCP servers for {}...\n", config.project_name);

    if !config.env_file_present {
        return Err(BootstrapError::MissingEnvFile(config.env_file.clone()).into());
    }

    let mut registry: Box<dyn Registry> = if args.dry_run {
        Box::new(DryRun::from_config(&config))
    } else {
        Box::new(HostCli::from_config(&config))
    };
    let summary = registrar::register_all(&descriptors, registry.as_mut());
    print_summary(&summary, &config.settings.host.program);

    if args.strict && summary.failed() > 0 {
        return Ok(PARTIAL_FAILURE_EXIT);
    }
    Ok(0)
}

fn print_summary(summary: &RegistrationSummary, host: &str) {
    println!("\n🎉 Setup complete!");
    println!("   Registered: {}", summary.success_count);
    if summary.skip_count > 0 {
        println!("   Skipped: {}", summary.skip_count);
    }
    let failed = summary.failed();
    if failed > 0 {
        println!("   Failed: {failed}");
    }
    println!("\nRun '{host} mcp list' to verify your MCP servers");
}

pub fn list(args: &ListArgs) -> Result<()> {
    let config = Configuration::load(args.project.project_root.as_deref())?;
    let descriptors = descriptor::resolve(&config, &launcher_exe()?)?;

    if args.json {
        let entries = descriptors.iter().map(ListEntry::from).collect::<Vec<_>>();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("failed to encode JSON listing")?
        );
        return Ok(());
    }

    println!("MCP servers for {}:", config.project_name);
    for descriptor in &descriptors {
        let target = match &descriptor.transport {
            Transport::Process { command } => command.to_string(),
            Transport::Http { url } => url.clone(),
        };
        println!("- {} ({})", descriptor.name, descriptor.transport.kind());
        println!("  {target}");
        if let Some(reason) = descriptor.skip_reason() {
            println!("  skipped: {reason}");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    #[serde(flatten)]
    transport: &'a Transport,
    enabled: bool,
    skip_reason: Option<&'a str>,
}

impl<'a> From<&'a ServiceDescriptor> for ListEntry<'a> {
    fn from(descriptor: &'a ServiceDescriptor) -> Self {
        Self {
            name: &descriptor.name,
            transport: &descriptor.transport,
            enabled: descriptor.is_enabled(),
            skip_reason: descriptor.skip_reason(),
        }
    }
}

fn launcher_exe() -> Result<PathBuf> {
    env::current_exe().context("failed to locate the mcp-bootstrap executable")
}
