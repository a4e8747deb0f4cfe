use tracing_subscriber::EnvFilter;

pub const LOG_ENV_KEY: &str = "MCP_BOOTSTRAP_LOG";

/// Installs a stderr subscriber. `MCP_BOOTSTRAP_LOG` takes precedence over
/// `verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { "mcp_bootstrap=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV_KEY).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
