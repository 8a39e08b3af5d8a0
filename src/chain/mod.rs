//! Request chaining: annotations, dependency graph, ordering and execution

pub mod annotations;
pub mod executor;
pub mod extract;
pub mod graph;
pub mod scheduler;

pub use annotations::{Annotations, Extraction};
pub use executor::{ChainExecutor, ChainObserver, ChainOutcome, ChainState};
pub use graph::{DependencyGraph, GraphBuilder, RequestNode};
pub use scheduler::ExecutionPlan;
