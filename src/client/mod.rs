//! Request execution
//!
//! The chain engine only sees [`RequestExecutor`]; [`HttpExecutor`] is the
//! reqwest-backed implementation the binary uses.

pub mod http;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::requests::RequestDefinition;

pub use http::{HttpExecutor, DEFAULT_HTTP_TIMEOUT, USER_AGENT_STRING};

/// What came back from executing one resolved request.
///
/// Transport failures are reported through `error`, never by panicking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub status: u16,
    /// In arrival order; repeated headers appear more than once
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn failed(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            error: Some(message.into()),
            duration_ms,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }

    /// First header with this name, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes a fully resolved request.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &RequestDefinition, cancel: &CancellationToken) -> ExecutionResult;
}
