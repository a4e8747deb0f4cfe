use std::env;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::BootstrapError;

pub const ENV_FILE_NAME: &str = ".env";
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";
pub const SETTINGS_ENV_KEY: &str = "MCP_BOOTSTRAP_CONFIG";
pub const SETTINGS_FILE_NAME: &str = "mcp-bootstrap.toml";

/// Everything the launcher and the registrar read, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub project_root: PathBuf,
    pub project_name: String,
    pub env_file: PathBuf,
    pub env_file_present: bool,
    pub database_url: Option<String>,
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,
}

impl Configuration {
    pub fn load(project_root: Option<&Path>) -> Result<Self> {
        let lookup = |key: &str| env::var(key).ok();
        Self::load_with(project_root, &lookup)
    }

    /// Same as [`Configuration::load`] but reads process variables through
    /// `lookup`, so callers can pin the environment.
    pub fn load_with(
        project_root: Option<&Path>,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let root = match project_root {
            Some(root) => root.to_path_buf(),
            None => env::current_dir().context("failed to resolve current directory")?,
        };
        let project_root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve project root {}", root.display()))?;
        if project_root.to_str().is_none() {
            return Err(BootstrapError::NonUtf8Path(project_root).into());
        }
        let project_name = project_name(&project_root)?;

        let env_file = project_root.join(ENV_FILE_NAME);
        let env_file_present = env_file.is_file();
        let file_value = if env_file_present {
            read_env_value(&env_file, DATABASE_URL_KEY)?
        } else {
            None
        };
        let database_url = non_empty(lookup(DATABASE_URL_KEY)).or_else(|| non_empty(file_value));

        let settings_path = settings_path(&project_root, lookup);
        let settings = match &settings_path {
            Some(path) => Settings::load_from(path)?,
            None => Settings::default(),
        };

        tracing::debug!(
            root = %project_root.display(),
            project = %project_name,
            env_file_present,
            database_url_set = database_url.is_some(),
            settings = ?settings_path,
            "configuration loaded"
        );

        Ok(Self {
            project_root,
            project_name,
            env_file,
            env_file_present,
            database_url,
            settings,
            settings_path,
        })
    }
}

fn project_name(root: &Path) -> Result<String, BootstrapError> {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BootstrapError::ProjectName(root.to_path_buf()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Reads one key from a dotenv file without touching the process environment.
/// Values are taken literally (`$NAME` is not expanded) and lines that do
/// not parse are skipped with a warning.
fn read_env_value(path: &Path, key: &str) -> Result<Option<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut found = None;
    for item in dotenvy::from_read_iter(Cursor::new(literal_dollars(&raw))) {
        match item {
            Ok((name, value)) if name == key => found = Some(value),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unparsable .env line");
            }
        }
    }
    Ok(found)
}

/// Escapes every `$` that dotenvy would treat as a substitution, i.e. those
/// in unquoted and double-quoted values. Keys, comments, single-quoted
/// values and already escaped dollars are left alone.
fn literal_dollars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut in_key = true;
    let mut value_start = false;
    let mut line_blank = true;
    let mut comment = false;

    for c in raw.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if q == '"' && c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            } else if q == '"' && c == '$' {
                out.push('\\');
            }
            out.push(c);
            continue;
        }

        if c == '\n' {
            in_key = true;
            value_start = false;
            line_blank = true;
            comment = false;
            escaped = false;
            out.push(c);
            continue;
        }
        if comment {
            out.push(c);
            continue;
        }
        if in_key {
            if c == '#' && line_blank {
                comment = true;
            } else if c == '=' {
                in_key = false;
                value_start = true;
            }
            if !c.is_whitespace() {
                line_blank = false;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
        } else if c.is_whitespace() {
            // Whitespace after the value starts a trailing comment.
            if !value_start {
                comment = true;
            }
            out.push(c);
            continue;
        } else {
            match c {
                '\'' | '"' => quote = Some(c),
                '\\' => escaped = true,
                '$' => out.push('\\'),
                _ => {}
            }
        }
        value_start = false;
        out.push(c);
    }
    out
}

fn settings_path(root: &Path, lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(raw) = lookup(SETTINGS_ENV_KEY) {
        let path = PathBuf::from(raw);
        return path.exists().then_some(path);
    }
    let project = root.join(SETTINGS_FILE_NAME);
    if project.is_file() {
        return Some(project);
    }
    let mut user = dirs::config_dir()?;
    user.push("mcp-bootstrap");
    user.push("config.toml");
    user.is_file().then_some(user)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub host: HostSection,
    #[serde(default)]
    pub launcher: LauncherSection,
    /// Extra servers registered after the built-in ones.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSection {
    pub program: String,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherSection {
    pub program: String,
    pub package: String,
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            package: "@modelcontextprotocol/server-postgres".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Process,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    pub name: String,
    #[serde(default)]
    pub transport: TransportKind,
    /// Program followed by its arguments (process transport).
    #[serde(default)]
    pub command: Vec<String>,
    /// Endpoint (http transport).
    #[serde(default)]
    pub url: Option<String>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings at {}", path.display()))?;
        let settings: Settings = toml::from_str(&raw).map_err(|err| {
            BootstrapError::InvalidSettings {
                path: path.to_path_buf(),
                message: err.message().to_string(),
            }
        })?;
        settings.validate().map_err(|message| BootstrapError::InvalidSettings {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        if self.host.program.trim().is_empty() {
            return Err("host.program cannot be empty".into());
        }
        if self.launcher.program.trim().is_empty() {
            return Err("launcher.program cannot be empty".into());
        }
        for server in &self.servers {
            if server.name.trim().is_empty() {
                return Err("server name cannot be empty".into());
            }
            match server.transport {
                TransportKind::Process if server.command.is_empty() => {
                    return Err(format!("server `{}` needs a command", server.name));
                }
                TransportKind::Http if server.url.as_deref().is_none_or(str::is_empty) => {
                    return Err(format!("server `{}` needs a url", server.name));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated(temp: &TempDir) -> impl Fn(&str) -> Option<String> {
        let missing = temp.path().join("no-settings.toml");
        move |key: &str| {
            (key == SETTINGS_ENV_KEY).then(|| missing.to_string_lossy().into_owned())
        }
    }

    #[test]
    fn derives_project_name_and_reads_env_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("shop-api");
        fs::create_dir(&root).unwrap();
        fs::write(
            root.join(".env"),
            "PORT=3000\nDATABASE_URL=postgres://localhost/shop\n",
        )
        .unwrap();

        let config = Configuration::load_with(Some(&root), &isolated(&temp)).unwrap();
        assert_eq!(config.project_name, "shop-api");
        assert!(config.env_file_present);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shop")
        );
        assert!(config.settings_path.is_none());
        assert_eq!(config.settings.host.program, "claude");
    }

    #[test]
    fn process_environment_wins_over_env_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "DATABASE_URL=postgres://file/db\n").unwrap();
        let missing = temp.path().join("no-settings.toml");
        let lookup = move |key: &str| match key {
            DATABASE_URL_KEY => Some("postgres://env/db".to_string()),
            SETTINGS_ENV_KEY => Some(missing.to_string_lossy().into_owned()),
            _ => None,
        };

        let config = Configuration::load_with(Some(temp.path()), &lookup).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://env/db"));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "DATABASE_URL=\n").unwrap();

        let config = Configuration::load_with(Some(temp.path()), &isolated(&temp)).unwrap();
        assert!(config.env_file_present);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn missing_env_file_is_not_an_error_at_load_time() {
        let temp = TempDir::new().unwrap();
        let config = Configuration::load_with(Some(temp.path()), &isolated(&temp)).unwrap();
        assert!(!config.env_file_present);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn project_settings_file_is_picked_up() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"
[host]
program = "my-host"

[[servers]]
name = "docs"
transport = "http"
url = "https://example.com/mcp"
"#,
        )
        .unwrap();
        let lookup = |_: &str| -> Option<String> { None };

        let config = Configuration::load_with(Some(temp.path()), &lookup).unwrap();
        assert_eq!(config.settings.host.program, "my-host");
        assert_eq!(config.settings.launcher.program, "npx");
        assert_eq!(config.settings.servers.len(), 1);
        assert_eq!(config.settings.servers[0].transport, TransportKind::Http);
    }

    #[test]
    fn rejects_process_server_without_command() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[[servers]]
name = "github"
transport = "process"
"#,
        )
        .unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("server `github` needs a command"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "[host]\nbinary = \"claude\"\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::InvalidSettings { .. }));
    }

    #[test]
    fn dollar_signs_are_kept_literally() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".env"),
            "HOME_DIR=/home/app\nDATABASE_URL=postgres://u:pa$sword@h/db\n",
        )
        .unwrap();

        let config = Configuration::load_with(Some(temp.path()), &isolated(&temp)).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://u:pa$sword@h/db")
        );
    }

    #[test]
    fn literal_dollars_respects_quoting() {
        assert_eq!(literal_dollars("A=x$y\n"), "A=x\\$y\n");
        assert_eq!(literal_dollars("A=\"x$y\"\n"), "A=\"x\\$y\"\n");
        assert_eq!(literal_dollars("A='x$y'\n"), "A='x$y'\n");
        assert_eq!(literal_dollars("A=x\\$y\n"), "A=x\\$y\n");
        assert_eq!(literal_dollars("# cost $5\nA=1 # $5\n"), "# cost $5\nA=1 # $5\n");
    }

    #[test]
    fn quoted_values_with_dollars_survive_parsing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        fs::write(
            &path,
            "A=\"x$y\"\nB='p$q'\nDATABASE_URL=\"postgres://u:$ecret@h/db\"\n",
        )
        .unwrap();

        assert_eq!(read_env_value(&path, "A").unwrap().as_deref(), Some("x$y"));
        assert_eq!(read_env_value(&path, "B").unwrap().as_deref(), Some("p$q"));
        assert_eq!(
            read_env_value(&path, DATABASE_URL_KEY).unwrap().as_deref(),
            Some("postgres://u:$ecret@h/db")
        );
    }

    #[test]
    fn unparsable_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".env"),
            "# app\nNOT A VALID LINE\nDATABASE_URL=postgres://h/db\n",
        )
        .unwrap();

        let config = Configuration::load_with(Some(temp.path()), &isolated(&temp)).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://h/db"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_project_root_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path().join(OsStr::from_bytes(b"shop\xff"));
        fs::create_dir(&root).unwrap();

        let err = Configuration::load_with(Some(&root), &isolated(&temp)).unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::NonUtf8Path(_)));
    }
}
