//! Chain execution
//!
//! ```text
//! Idle -> BuildingGraph -> Scheduling -> Executing(0) -> Extracting(0)
//!      -> Executing(1) -> ... -> Complete
//! ```
//!
//! Any error moves the chain to `Aborted`. Session values written by steps
//! that already finished stay in the store.

use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extract;
use super::graph::{GraphBuilder, RequestNode};
use super::scheduler::{self, ExecutionPlan};
use crate::client::{ExecutionResult, RequestExecutor};
use crate::errors::{ReqtreeError, Result, ShellError};
use crate::requests::FileParser;
use crate::variables::{TextResolver, VariableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    BuildingGraph,
    Scheduling,
    Executing(usize),
    Extracting(usize),
    Complete,
    Aborted,
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainState::Idle => write!(f, "idle"),
            ChainState::BuildingGraph => write!(f, "building graph"),
            ChainState::Scheduling => write!(f, "scheduling"),
            ChainState::Executing(i) => write!(f, "executing step {}", i + 1),
            ChainState::Extracting(i) => write!(f, "extracting from step {}", i + 1),
            ChainState::Complete => write!(f, "complete"),
            ChainState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Hooks for progress reporting. All methods default to doing nothing.
pub trait ChainObserver: Send + Sync {
    fn on_plan(&self, _plan: &ExecutionPlan) {}
    fn on_step_start(&self, _index: usize, _total: usize, _node: &RequestNode) {}
    fn on_step_finish(&self, _index: usize, _total: usize, _node: &RequestNode, _result: &ExecutionResult) {}
    fn on_extracted(&self, _node: &RequestNode, _variable: &str, _value: &str) {}
    fn on_warning(&self, _node: &RequestNode, _warning: &ShellError) {}
}

/// A finished chain
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Raw result of the target request
    pub result: ExecutionResult,
    pub plan: ExecutionPlan,
    /// Session writes made by the chain, in order
    pub extracted: Vec<(String, String)>,
    pub warnings: Vec<ShellError>,
}

pub struct ChainExecutor<'a> {
    parser: &'a dyn FileParser,
    executor: &'a dyn RequestExecutor,
    resolver: &'a TextResolver,
    base_dir: PathBuf,
    default_headers: IndexMap<String, String>,
    observer: Option<&'a dyn ChainObserver>,
    state: ChainState,
}

impl<'a> ChainExecutor<'a> {
    pub fn new(
        parser: &'a dyn FileParser,
        executor: &'a dyn RequestExecutor,
        resolver: &'a TextResolver,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parser,
            executor,
            resolver,
            base_dir: base_dir.into(),
            default_headers: IndexMap::new(),
            observer: None,
            state: ChainState::Idle,
        }
    }

    /// Headers added to every request that does not set them itself
    pub fn with_default_headers(mut self, headers: IndexMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn ChainObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Builds and orders the chain for `target` without executing anything.
    pub fn plan(&mut self, target: &Path) -> Result<ExecutionPlan> {
        let plan = self.build_plan(target);
        self.finish(plan.as_ref().err());
        plan
    }

    /// Runs every step for `target` in dependency order and returns the
    /// target's result.
    pub async fn run(
        &mut self,
        target: &Path,
        store: &mut VariableStore,
        cancel: &CancellationToken,
    ) -> Result<ChainOutcome> {
        let outcome = self.run_steps(target, store, cancel).await;
        self.finish(outcome.as_ref().err());
        outcome
    }

    fn transition(&mut self, next: ChainState) {
        debug!(from = %self.state, to = %next, "Chain state");
        self.state = next;
    }

    fn finish(&mut self, error: Option<&ReqtreeError>) {
        match error {
            None => self.transition(ChainState::Complete),
            Some(e) => {
                debug!(error = %e, state = %self.state, "Chain aborted");
                self.transition(ChainState::Aborted);
            }
        }
    }

    fn build_plan(&mut self, target: &Path) -> Result<ExecutionPlan> {
        self.transition(ChainState::BuildingGraph);
        let graph = GraphBuilder::new(self.parser, &self.base_dir).build(target)?;

        self.transition(ChainState::Scheduling);
        scheduler::schedule(&graph)
    }

    async fn run_steps(
        &mut self,
        target: &Path,
        store: &mut VariableStore,
        cancel: &CancellationToken,
    ) -> Result<ChainOutcome> {
        if cancel.is_cancelled() {
            return Err(ReqtreeError::Cancelled);
        }

        let plan = self.build_plan(target)?;
        if let Some(observer) = self.observer {
            observer.on_plan(&plan);
        }

        let total = plan.len();
        let mut extracted = Vec::new();
        let mut warnings = Vec::new();
        let mut last = None;

        for (index, node) in plan.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ReqtreeError::Cancelled);
            }

            self.transition(ChainState::Executing(index));
            if let Some(observer) = self.observer {
                observer.on_step_start(index, total, node);
            }

            let mut request = node.request.clone();
            request.merge_headers(&self.default_headers);
            let resolution = self
                .resolver
                .resolve_request(&request, store, cancel)
                .await
                .map_err(|e| ReqtreeError::resolving(&node.path, e))?;
            if let Some(observer) = self.observer {
                for warning in &resolution.warnings {
                    observer.on_warning(node, warning);
                }
            }

            let result = self.executor.execute(&resolution.value, cancel).await;
            if cancel.is_cancelled() {
                return Err(ReqtreeError::Cancelled);
            }
            if let Some(error) = &result.error {
                let message = match resolution.last_warning() {
                    Some(warning) => format!("{} (after failed substitution: {})", error, warning),
                    None => error.clone(),
                };
                return Err(ReqtreeError::Transport {
                    path: node.path.clone(),
                    message,
                });
            }
            warnings.extend(resolution.warnings);

            if let Some(observer) = self.observer {
                observer.on_step_finish(index, total, node, &result);
            }
            if index + 1 < total && !result.is_success() {
                warn!(path = %node.path.display(), status = result.status, "Dependency returned a non-success status");
            }

            if !node.extractions.is_empty() {
                self.transition(ChainState::Extracting(index));
                let body = extract::parse_body(&node.path, &result.body)?;
                for extraction in &node.extractions {
                    let value = extract::evaluate(&node.path, &body, extraction)?;
                    debug!(variable = %extraction.variable, path = %node.path.display(), "Extracted session variable");
                    store.set_session(extraction.variable.as_str(), value.as_str());
                    if let Some(observer) = self.observer {
                        observer.on_extracted(node, &extraction.variable, &value);
                    }
                    extracted.push((extraction.variable.clone(), value));
                }
            }

            last = Some(result);
        }

        let result = last.ok_or_else(|| ReqtreeError::parse(target, "nothing to execute"))?;
        info!(steps = total, status = result.status, "Chain complete");

        Ok(ChainOutcome {
            result,
            plan,
            extracted,
            warnings,
        })
    }
}
