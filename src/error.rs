use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("{} file not found", .0.display())]
    MissingEnvFile(PathBuf),

    #[error("{key} not found in environment variables")]
    MissingValue { key: &'static str },

    #[error("invalid settings in {}: {message}", path.display())]
    InvalidSettings { path: PathBuf, message: String },

    #[error("cannot derive a project name from {}", .0.display())]
    ProjectName(PathBuf),

    #[error("{} is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("failed to find `{name}` in PATH; set {env_key} or install {name}")]
    BinaryNotFound { name: String, env_key: String },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {}", describe_code(.code))]
    Subprocess { program: String, code: Option<i32> },
}

impl BootstrapError {
    /// Operator-facing follow-up printed under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            BootstrapError::MissingEnvFile(_) => {
                Some("Please create .env file from .env.example and configure it")
            }
            BootstrapError::MissingValue { .. } => Some("Please set DATABASE_URL in your .env file"),
            _ => None,
        }
    }
}

/// Prints a fatal error and its hint to stderr.
pub fn report(err: &anyhow::Error) {
    eprintln!("❌ {err:#}");
    if let Some(hint) = err.downcast_ref::<BootstrapError>().and_then(BootstrapError::hint) {
        eprintln!("{hint}");
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
