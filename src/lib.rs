//! reqtree library interface
//!
//! Runs API requests kept as plain files, following `@depends` chains,
//! substituting variables and harvesting response values for later requests.
//!
//! # Module Organization
//!
//! - [`variables`] - Variable store, value shapes and text resolution
//! - [`requests`] - Request files and parsers
//! - [`chain`] - Dependency graph, scheduling and chain execution
//! - [`client`] - Request execution over HTTP
//! - [`context`] - Workspace owning profiles, store and session file
//! - [`errors`] - Error types (ReqtreeError, Result)
//! - [`status`] - Exit status codes (ExitStatus)

pub mod chain;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod output;
pub mod profiles;
pub mod requests;
pub mod sessions;
pub mod signals;
pub mod status;
pub mod variables;

pub use errors::{ReqtreeError, Result};
