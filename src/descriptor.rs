use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::config::{Configuration, SETTINGS_FILE_NAME, ServerEntry, TransportKind};
use crate::error::BootstrapError;

const CONTEXT7_URL: &str = "https://mcp.context7.com/mcp";

/// A program plus arguments, kept apart so nothing is ever re-parsed by a shell.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn npx(package: &str) -> Self {
        Self::new("npx", [package])
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum Transport {
    /// The host CLI spawns and manages the command as a long-lived server.
    Process { command: CommandLine },
    /// The host CLI connects to a remote endpoint.
    Http { url: String },
}

impl Transport {
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Process { .. } => "process",
            Transport::Http { .. } => "http",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Enablement {
    Enabled,
    Disabled { reason: String },
}

impl Enablement {
    fn when(condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            Enablement::Enabled
        } else {
            Enablement::Disabled {
                reason: reason.into(),
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub transport: Transport,
    pub enablement: Enablement,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, transport: Transport) -> Self {
        Self {
            name: name.into(),
            transport,
            enablement: Enablement::Enabled,
        }
    }

    pub fn with_enablement(mut self, enablement: Enablement) -> Self {
        self.enablement = enablement;
        self
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.enablement, Enablement::Enabled)
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match &self.enablement {
            Enablement::Enabled => None,
            Enablement::Disabled { reason } => Some(reason),
        }
    }
}

/// Builds the ordered descriptor list for `config`. Enable conditions are
/// resolved here, once, from the loaded configuration.
///
/// `launcher_exe` is the executable that serves `launch` for the postgres
/// entry, normally the running `mcp-bootstrap` binary.
pub fn resolve(config: &Configuration, launcher_exe: &Path) -> Result<Vec<ServiceDescriptor>> {
    let project = &config.project_name;
    let root = utf8(&config.project_root)?.to_string();
    let launcher_exe = utf8(launcher_exe)?;

    let mut descriptors = vec![
        ServiceDescriptor::new(
            format!("postgres-{project}"),
            Transport::Process {
                command: CommandLine::new(
                    launcher_exe,
                    ["launch".to_string(), "--project-root".to_string(), root.clone()],
                ),
            },
        )
        .with_enablement(Enablement::when(
            config.database_url.is_some(),
            "DATABASE_URL not set, skipping postgres MCP",
        )),
        ServiceDescriptor::new(
            format!("fetch-{project}"),
            Transport::Process {
                command: CommandLine::npx("@modelcontextprotocol/server-fetch"),
            },
        ),
        ServiceDescriptor::new(
            format!("filesystem-{project}"),
            Transport::Process {
                command: CommandLine::new(
                    "npx",
                    ["@modelcontextprotocol/server-filesystem".to_string(), root],
                ),
            },
        ),
        ServiceDescriptor::new(
            format!("memory-{project}"),
            Transport::Process {
                command: CommandLine::npx("@modelcontextprotocol/server-memory"),
            },
        ),
        ServiceDescriptor::new(
            format!("context7-{project}"),
            Transport::Http {
                url: CONTEXT7_URL.to_string(),
            },
        ),
    ];

    descriptors.extend(
        config
            .settings
            .servers
            .iter()
            .map(|entry| from_entry(entry, project)),
    );

    let mut seen = HashSet::new();
    for descriptor in &descriptors {
        if !seen.insert(descriptor.name.as_str()) {
            // Built-in names are distinct, so a clash always comes from settings.
            return Err(BootstrapError::InvalidSettings {
                path: config
                    .settings_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME)),
                message: format!("duplicate MCP server name `{}`", descriptor.name),
            }
            .into());
        }
    }

    Ok(descriptors)
}

/// Paths end up as command arguments, so they must survive as text.
fn utf8(path: &Path) -> Result<&str, BootstrapError> {
    path.to_str()
        .ok_or_else(|| BootstrapError::NonUtf8Path(path.to_path_buf()))
}

fn from_entry(entry: &ServerEntry, project: &str) -> ServiceDescriptor {
    let transport = match entry.transport {
        TransportKind::Process => {
            let (program, args) = entry
                .command
                .split_first()
                .map(|(program, args)| (program.clone(), args.to_vec()))
                .unwrap_or_default();
            Transport::Process {
                command: CommandLine::new(program, args),
            }
        }
        TransportKind::Http => Transport::Http {
            url: entry.url.clone().unwrap_or_default(),
        },
    };
    ServiceDescriptor::new(format!("{}-{project}", entry.name), transport)
}
