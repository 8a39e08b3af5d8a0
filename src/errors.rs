//! Error types for reqtree

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for reqtree
#[derive(Error, Debug)]
pub enum ReqtreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Bad request file, bad `@depends` syntax or a missing dependency file
    #[error("Parse error in {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        message: String,
    },

    /// A request file depends on itself, directly or through other files
    #[error("Dependency cycle detected at {}: {}", .node.display(), format_cycle(.cycle))]
    Cycle {
        node: PathBuf,
        cycle: Vec<PathBuf>,
    },

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error("Variable '{name}' has active index {active} but only {len} option(s)")]
    VariableRange {
        name: String,
        active: usize,
        len: usize,
    },

    #[error("Extraction failed in {}: {message}", .path.display())]
    Extraction {
        path: PathBuf,
        message: String,
    },

    /// A request could not be resolved against the variable store
    #[error("Cannot resolve request in {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: Box<ReqtreeError>,
    },

    /// Failure reported by the request executor, bubbled up opaquely
    #[error("Request failed in {}: {message}", .path.display())]
    Transport {
        path: PathBuf,
        message: String,
    },

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Chain cancelled")]
    Cancelled,
}

impl ReqtreeError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReqtreeError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReqtreeError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attaches the request file a resolution error came from.
    /// Cancellation is returned unchanged.
    pub fn resolving(path: impl Into<PathBuf>, error: ReqtreeError) -> Self {
        match error {
            ReqtreeError::Cancelled => ReqtreeError::Cancelled,
            other => ReqtreeError::Resolve {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Why a `$(command)` substitution did not produce a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellFailure {
    #[error("exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not be started: {0}")]
    Spawn(String),
}

/// A failed `$(command)` substitution.
///
/// Inside the text resolver this is a warning attached to the resolution,
/// not an abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Shell command `{command}` {reason}")]
pub struct ShellError {
    pub command: String,
    pub reason: ShellFailure,
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, ReqtreeError>;
