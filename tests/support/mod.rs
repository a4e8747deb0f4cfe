#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway project directory plus stub `claude` and `npx` binaries that
/// record their arguments to `invocations.log`.
pub struct Project {
    pub root: PathBuf,
    pub host: PathBuf,
    pub npx: PathBuf,
    pub log: PathBuf,
    _tempdir: TempDir,
}

impl Project {
    pub fn new(name: &str) -> Self {
        let tmp = tempfile::Builder::new()
            .prefix("mcp-bootstrap-")
            .tempdir()
            .expect("temp workspace");
        let root = tmp.path().join(name);
        fs::create_dir_all(&root).unwrap();
        let bin_dir = tmp.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let log = tmp.path().join("invocations.log");

        let host = write_stub(
            &bin_dir,
            "claude",
            r#"echo "$*" >> "$STUB_LOG"
if [ -n "$STUB_FAIL" ]; then
  case "$*" in
    *"$STUB_FAIL"*) echo "stub host refused $STUB_FAIL" >&2; exit 1 ;;
  esac
fi
exit 0"#,
        );
        let npx = write_stub(
            &bin_dir,
            "npx",
            r#"echo "$*" >> "$STUB_LOG"
exit "${STUB_EXIT:-0}""#,
        );

        Self {
            root,
            host,
            npx,
            log,
            _tempdir: tmp,
        }
    }

    pub fn write_env(&self, contents: &str) {
        fs::write(self.root.join(".env"), contents).unwrap();
    }

    /// Lines recorded by the stubs; empty when nothing ran.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|raw| raw.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Pins the environment a binary sees: stubs on the override keys, no
    /// inherited DATABASE_URL, no user-level settings.
    pub fn configure(&self, cmd: &mut Command) {
        cmd.env_remove("DATABASE_URL")
            .env_remove("STUB_FAIL")
            .env_remove("STUB_EXIT")
            .env_remove("MCP_BOOTSTRAP_LOG")
            .env("MCP_BOOTSTRAP_BIN_CLAUDE", &self.host)
            .env("MCP_BOOTSTRAP_BIN_NPX", &self.npx)
            .env("MCP_BOOTSTRAP_CONFIG", self.root.join("absent.toml"))
            .env("STUB_LOG", &self.log);
    }
}

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();

    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();

    path
}
