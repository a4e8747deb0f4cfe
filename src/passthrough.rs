use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::BootstrapError;
use crate::util::process::CommandSpec;

/// Environment variable that overrides resolution of `name`, e.g.
/// `MCP_BOOTSTRAP_BIN_CLAUDE` for `claude`.
pub fn override_key(name: &str) -> String {
    format!("MCP_BOOTSTRAP_BIN_{}", name.replace('-', "_").to_uppercase())
}

/// Resolve a binary by name using env override, PATH, then the project's
/// `node_modules/.bin`.
pub fn resolve_binary(name: &str, project_root: &Path) -> Result<PathBuf, BootstrapError> {
    let env_key = override_key(name);
    if let Some(path) = env::var_os(&env_key) {
        let pb = PathBuf::from(path);
        if pb.exists() {
            tracing::debug!(binary = name, path = %pb.display(), "resolved via {env_key}");
            return Ok(pb);
        }
        tracing::warn!(binary = name, path = %pb.display(), "{env_key} points to a missing file");
        return Err(BootstrapError::BinaryNotFound {
            name: name.to_string(),
            env_key,
        });
    }

    // Explicit paths skip the lookup entirely.
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        if direct.exists() {
            return Ok(direct.to_path_buf());
        }
        return Err(BootstrapError::BinaryNotFound {
            name: name.to_string(),
            env_key,
        });
    }

    if let Ok(path) = which::which(name) {
        tracing::debug!(binary = name, path = %path.display(), "resolved on PATH");
        return Ok(path);
    }

    let local = project_root.join("node_modules").join(".bin").join(name);
    if local.exists() {
        tracing::debug!(binary = name, path = %local.display(), "resolved in node_modules");
        return Ok(local);
    }

    Err(BootstrapError::BinaryNotFound {
        name: name.to_string(),
        env_key,
    })
}

/// Run `spec` to completion with stdin, stdout and stderr connected to ours.
pub fn run_passthrough(spec: &CommandSpec) -> Result<ExitStatus, BootstrapError> {
    tracing::debug!(program = %spec.program_name(), args = spec.args.len(), "spawning");
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = &spec.current_dir {
        command.current_dir(dir);
    }

    let status = command.status().map_err(|source| BootstrapError::Spawn {
        program: spec.program_name(),
        source,
    })?;
    tracing::debug!(program = %spec.program_name(), code = ?status.code(), "finished");
    Ok(status)
}
