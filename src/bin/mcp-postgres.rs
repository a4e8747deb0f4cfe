use std::process;

use clap::Parser;
use mcp_bootstrap::cli::LauncherCli;
use mcp_bootstrap::config::Configuration;
use mcp_bootstrap::{error, launcher, logging};

fn main() {
    let cli = LauncherCli::parse();
    logging::init(cli.verbose);

    match Configuration::load(cli.project.project_root.as_deref())
        .and_then(|config| launcher::launch(&config))
    {
        Ok(code) => process::exit(code),
        Err(err) => {
            error::report(&err);
            process::exit(1);
        }
    }
}
