//! Starts the PostgreSQL MCP server with the project's connection string.
//!
//! The host CLI talks to the server over stdio, so nothing here may write to
//! stdout; diagnostics go through `tracing`, which writes to stderr.

use anyhow::Result;

use crate::config::{Configuration, DATABASE_URL_KEY};
use crate::error::BootstrapError;
use crate::passthrough::{resolve_binary, run_passthrough};
use crate::util::process::CommandSpec;

/// Builds the server invocation. Fails before anything is resolved or
/// spawned when the connection string is missing.
pub fn server_command(config: &Configuration) -> Result<CommandSpec, BootstrapError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(BootstrapError::MissingValue {
            key: DATABASE_URL_KEY,
        })?;
    let launcher = &config.settings.launcher;
    let program = resolve_binary(&launcher.program, &config.project_root)?;
    Ok(CommandSpec::new(program)
        .arg(&launcher.package)
        .arg(database_url))
}

/// Runs the server to completion and returns the exit code to mirror.
/// A child that reports no code (killed by a signal) maps to 0.
pub fn launch(config: &Configuration) -> Result<i32> {
    let spec = server_command(config)?;
    tracing::info!(
        program = %spec.program_name(),
        package = %config.settings.launcher.package,
        project = %config.project_name,
        "starting PostgreSQL MCP server"
    );
    let status = run_passthrough(&spec)?;
    Ok(status.code().unwrap_or(0))
}
