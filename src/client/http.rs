//! reqwest-backed request executor

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::{ExecutionResult, RequestExecutor};
use crate::errors::{ReqtreeError, Result};
use crate::requests::RequestDefinition;

pub const USER_AGENT_STRING: &str = concat!("reqtree/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT_STRING))
            .timeout(timeout)
            .referer(false)
            .build()
            .map_err(|e| ReqtreeError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn send(&self, request: &RequestDefinition) -> std::result::Result<ExecutionResult, String> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| format!("invalid method '{}'", request.method))?;
        let url = Url::parse(&request.url).map_err(|e| format!("invalid URL '{}': {}", request.url, e))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.text().await.map_err(|e| e.to_string())?;

        Ok(ExecutionResult {
            status,
            headers,
            body,
            duration_ms: 0,
            error: None,
        })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: &RequestDefinition, cancel: &CancellationToken) -> ExecutionResult {
        let start = Instant::now();
        debug!(method = %request.method, url = %request.url, "Sending request");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err("request cancelled".to_string()),
            outcome = self.send(request) => outcome,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                debug!(status = result.status, duration_ms, "Received response");
                ExecutionResult { duration_ms, ..result }
            }
            Err(message) => ExecutionResult::failed(message, duration_ms),
        }
    }
}
