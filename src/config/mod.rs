//! Config file handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::DEFAULT_HTTP_TIMEOUT;
use crate::errors::{ReqtreeError, Result};
use crate::variables::{ShellRunner, DEFAULT_SHELL_TIMEOUT};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "REQTREE_CONFIG_DIR";

/// Profiles file names looked for in a workspace root, in order
pub const PROFILE_FILE_NAMES: [&str; 3] = [
    "reqtree.profiles.yaml",
    "reqtree.profiles.yml",
    "reqtree.profiles.toml",
];

/// reqtree configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub config_dir: PathBuf,
    /// Bound on each `$(...)` substitution
    pub shell_timeout: Duration,
    /// Shell used for substitutions; platform default when unset
    pub shell_program: Option<String>,
    pub http_timeout: Duration,
    pub user_agent: Option<String>,
    /// Relative to the workspace root unless absolute
    pub profiles_file: Option<PathBuf>,
    /// Relative to the workspace root unless absolute
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            shell_timeout: DEFAULT_SHELL_TIMEOUT,
            shell_program: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: None,
            profiles_file: None,
            session_file: None,
        }
    }
}

impl Config {
    /// Load configuration from `config.toml` in the config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_dir())
    }

    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let config_file = config_dir.join("config.toml");

        if !config_file.exists() {
            return Ok(Self {
                config_dir: config_dir.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&config_file)
            .map_err(|e| ReqtreeError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&content, config_dir)
    }

    /// Parse config TOML; `config_dir` is recorded as-is
    pub fn parse(content: &str, config_dir: &Path) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| ReqtreeError::Config(format!("Invalid config TOML: {}", e)))?;

        let shell_timeout = parse_duration(&toml_value, "shell", "timeout")?.unwrap_or(DEFAULT_SHELL_TIMEOUT);
        let http_timeout = parse_duration(&toml_value, "http", "timeout")?.unwrap_or(DEFAULT_HTTP_TIMEOUT);

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            shell_timeout,
            shell_program: get_str(&toml_value, "shell", "program").map(String::from),
            http_timeout,
            user_agent: get_str(&toml_value, "http", "user_agent").map(String::from),
            profiles_file: get_str(&toml_value, "workspace", "profiles_file").map(PathBuf::from),
            session_file: get_str(&toml_value, "workspace", "session_file").map(PathBuf::from),
        })
    }

    /// `$REQTREE_CONFIG_DIR`, else `<config dir>/reqtree`
    pub fn default_config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .map(|p| p.join("reqtree"))
            .unwrap_or_else(|| PathBuf::from(".reqtree"))
    }

    /// Profiles file for a workspace: the configured one, else the first
    /// existing default name, else `reqtree.profiles.yaml`.
    pub fn profiles_path(&self, root: &Path) -> PathBuf {
        if let Some(file) = &self.profiles_file {
            return root.join(file);
        }
        PROFILE_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| root.join(PROFILE_FILE_NAMES[0]))
    }

    pub fn session_path(&self, root: &Path) -> PathBuf {
        match &self.session_file {
            Some(file) => root.join(file),
            None => root.join(".reqtree").join("session.json"),
        }
    }

    pub fn shell_runner(&self) -> ShellRunner {
        let runner = ShellRunner::new(self.shell_timeout);
        match &self.shell_program {
            Some(program) => runner.with_program(program.clone()),
            None => runner,
        }
    }
}

fn get_str<'a>(toml: &'a toml::Value, section: &str, key: &str) -> Option<&'a str> {
    toml.get(section).and_then(|s| s.get(key)).and_then(|v| v.as_str())
}

fn parse_duration(toml: &toml::Value, section: &str, key: &str) -> Result<Option<Duration>> {
    match get_str(toml, section, key) {
        Some(text) => humantime::parse_duration(text)
            .map(Some)
            .map_err(|e| ReqtreeError::Config(format!("Invalid {}.{} '{}': {}", section, key, text, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.shell_timeout, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.shell_program.is_none());
    }

    #[test]
    fn test_parse_all_keys() {
        let content = r#"
[shell]
timeout = "2s 500ms"
program = "bash"

[http]
timeout = "1m"
user_agent = "ci-bot/1.0"

[workspace]
profiles_file = "env/profiles.toml"
session_file = "/tmp/reqtree-session.json"
"#;
        let config = Config::parse(content, Path::new("/cfg")).unwrap();
        assert_eq!(config.shell_timeout, Duration::from_millis(2500));
        assert_eq!(config.shell_program.as_deref(), Some("bash"));
        assert_eq!(config.http_timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent.as_deref(), Some("ci-bot/1.0"));
        assert_eq!(
            config.profiles_path(Path::new("/ws")),
            PathBuf::from("/ws/env/profiles.toml")
        );
        assert_eq!(
            config.session_path(Path::new("/ws")),
            PathBuf::from("/tmp/reqtree-session.json")
        );
        assert_eq!(config.shell_runner().timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_duration() {
        let err = Config::parse("[shell]\ntimeout = \"soon\"\n", Path::new("/cfg")).unwrap_err();
        assert!(err.to_string().contains("shell.timeout"));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[shell\n").unwrap();
        assert!(matches!(Config::load_from(dir.path()), Err(ReqtreeError::Config(_))));
    }

    #[test]
    fn test_default_workspace_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        assert_eq!(
            config.profiles_path(dir.path()),
            dir.path().join("reqtree.profiles.yaml")
        );

        std::fs::write(dir.path().join("reqtree.profiles.toml"), "").unwrap();
        assert_eq!(
            config.profiles_path(dir.path()),
            dir.path().join("reqtree.profiles.toml")
        );
        assert_eq!(
            config.session_path(dir.path()),
            dir.path().join(".reqtree").join("session.json")
        );
    }
}
