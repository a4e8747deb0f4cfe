use std::process;

use clap::Parser;
use mcp_bootstrap::cli::{Cli, Command};
use mcp_bootstrap::config::Configuration;
use mcp_bootstrap::{error, launcher, logging, setup_cmd};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Command::Setup(args) => setup_cmd::run(&args),
        Command::Launch(args) => Configuration::load(args.project.project_root.as_deref())
            .and_then(|config| launcher::launch(&config)),
        Command::List(args) => setup_cmd::list(&args).map(|()| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            error::report(&err);
            process::exit(1);
        }
    }
}
