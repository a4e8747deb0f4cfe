use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;

use crate::config::Configuration;
use crate::descriptor::{ServiceDescriptor, Transport};
use crate::error::BootstrapError;
use crate::passthrough::{resolve_binary, run_passthrough};
use crate::util::process::CommandSpec;

/// Something that can register a server with the host CLI.
pub trait Registry {
    fn register(&mut self, descriptor: &ServiceDescriptor) -> Result<()>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistrationOutcome {
    Registered,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct RegistrationSummary {
    pub success_count: usize,
    pub skip_count: usize,
    pub outcomes: Vec<(String, RegistrationOutcome)>,
}

impl RegistrationSummary {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, RegistrationOutcome::Failed(_)))
            .count()
    }
}

/// Registers every enabled descriptor in order. A failed registration is
/// reported and recorded; it never stops the remaining descriptors.
pub fn register_all(
    descriptors: &[ServiceDescriptor],
    registry: &mut dyn Registry,
) -> RegistrationSummary {
    let mut summary = RegistrationSummary::default();

    for descriptor in descriptors {
        let name = descriptor.name.clone();
        if let Some(reason) = descriptor.skip_reason() {
            println!("⚠️  {reason}");
            tracing::debug!(server = %name, "skipped");
            summary.skip_count += 1;
            summary
                .outcomes
                .push((name, RegistrationOutcome::Skipped(reason.to_string())));
            continue;
        }

        println!("📦 Registering {name}...");
        match registry.register(descriptor) {
            Ok(()) => {
                println!("✅ {name} registered\n");
                summary.success_count += 1;
                summary.outcomes.push((name, RegistrationOutcome::Registered));
            }
            Err(err) => {
                eprintln!("❌ Failed to register {name}");
                eprintln!("{err:#}");
                println!();
                tracing::debug!(server = %name, error = %err, "registration failed");
                summary
                    .outcomes
                    .push((name, RegistrationOutcome::Failed(format!("{err:#}"))));
            }
        }
    }

    summary
}

/// The host CLI invocation that registers `descriptor`.
pub fn host_invocation(host: impl Into<OsString>, descriptor: &ServiceDescriptor) -> CommandSpec {
    let spec = CommandSpec::new(host).args(["mcp", "add"]);
    match &descriptor.transport {
        Transport::Process { command } => spec
            .arg(&descriptor.name)
            .arg("--")
            .arg(&command.program)
            .args(&command.args),
        Transport::Http { url } => spec
            .args(["--transport", "http"])
            .arg(&descriptor.name)
            .arg(url),
    }
}

/// Registers servers by running the host CLI with inherited stdio, so its
/// prompts and output reach the operator.
pub struct HostCli {
    program: String,
    project_root: PathBuf,
}

impl HostCli {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            program: config.settings.host.program.clone(),
            project_root: config.project_root.clone(),
        }
    }
}

impl Registry for HostCli {
    fn register(&mut self, descriptor: &ServiceDescriptor) -> Result<()> {
        let bin = resolve_binary(&self.program, &self.project_root)?;
        let spec = host_invocation(bin, descriptor).current_dir(&self.project_root);
        tracing::debug!(command = %spec, "registering");
        let status = run_passthrough(&spec)?;
        if !status.success() {
            return Err(BootstrapError::Subprocess {
                program: self.program.clone(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

/// Prints what would be run instead of running it.
pub struct DryRun {
    program: String,
}

impl DryRun {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            program: config.settings.host.program.clone(),
        }
    }
}

impl Registry for DryRun {
    fn register(&mut self, descriptor: &ServiceDescriptor) -> Result<()> {
        println!("   {}", host_invocation(&self.program, descriptor));
        Ok(())
    }
}
