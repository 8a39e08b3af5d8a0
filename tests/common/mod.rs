//! Common test utilities for reqtree integration tests
//!
//! - Temporary workspaces with request and profile files
//! - CLI invocation with an isolated config directory
//! - Mock HTTP server setup using wiremock

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::MockServer;

/// Exit status codes matching the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Error = 1,
    Interrupted = 130,
}

impl From<i32> for ExitStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => ExitStatus::Success,
            130 => ExitStatus::Interrupted,
            _ => ExitStatus::Error,
        }
    }
}

/// Result of running the CLI
#[derive(Debug)]
pub struct CliResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: ExitStatus,
    pub exit_code: i32,
}

impl CliResponse {
    fn from_output(output: Output) -> Self {
        let exit_code = output.status.code().unwrap_or(-1);
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_status: ExitStatus::from(exit_code),
            exit_code,
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.stdout.contains(needle)
    }

    /// The body printed after the status line and headers
    pub fn body(&self) -> Option<&str> {
        self.stdout.find("\n\n").map(|pos| &self.stdout[pos + 2..])
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        self.body().and_then(|b| serde_json::from_str(b).ok())
    }
}

impl std::fmt::Display for CliResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stdout:\n{}\nstderr:\n{}", self.stdout, self.stderr)
    }
}

/// A workspace root plus an isolated config directory
pub struct TestWorkspace {
    pub root: TempDir,
    pub config_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        let config_dir = TempDir::new().expect("Failed to create temp config dir");
        // Keep hung requests from stalling the suite
        fs::write(
            config_dir.path().join("config.toml"),
            "[http]\ntimeout = \"5s\"\n\n[shell]\ntimeout = \"2s\"\n",
        )
        .expect("Failed to write config");

        Self {
            root: TempDir::new().expect("Failed to create temp workspace"),
            config_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Writes `content` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write workspace file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join(relative)).expect("Failed to read workspace file")
    }

    pub fn write_profiles(&self, content: &str) -> PathBuf {
        self.write("reqtree.profiles.yaml", content)
    }

    /// Parsed `.reqtree/session.json`, or null when absent
    pub fn session(&self) -> serde_json::Value {
        let path = self.root.path().join(".reqtree").join("session.json");
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).expect("Session file is not JSON"),
            Err(_) => serde_json::Value::Null,
        }
    }

    pub fn session_variable(&self, name: &str) -> Option<String> {
        self.session()["variables"][name].as_str().map(String::from)
    }

    /// Runs the reqtree binary against this workspace
    pub fn run(&self, args: &[&str]) -> CliResponse {
        let output = Command::new(reqtree_bin())
            .arg("--root")
            .arg(self.root.path())
            .arg("--no-prompt")
            .args(args)
            .current_dir(self.root.path())
            .env("REQTREE_CONFIG_DIR", self.config_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("REQTREE_ROOT")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run reqtree");
        CliResponse::from_output(output)
    }
}

pub fn reqtree_bin() -> &'static str {
    env!("CARGO_BIN_EXE_reqtree")
}

/// Starts a mock server
pub async fn mock_server() -> MockServer {
    MockServer::start().await
}

/// A profiles file with a single `dev` profile pointing at `base_url`
pub fn profiles_for(base_url: &str) -> String {
    format!(
        "default: dev\nprofiles:\n  dev:\n    variables:\n      baseUrl: {}\n  prod:\n    variables:\n      baseUrl: https://prod.invalid\n",
        base_url
    )
}
