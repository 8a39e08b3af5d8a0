//! Execution order for a dependency graph
//!
//! Depth-first topological sort from the target. A node is marked in
//! progress on entry and done on exit; reaching an in-progress node again
//! means a cycle. Dependencies are visited in declaration order, so the
//! result is stable for a given set of files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::annotations::Extraction;
use super::graph::{DependencyGraph, RequestNode};
use crate::errors::{ReqtreeError, Result};

/// Nodes in execution order, ending with the target
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub steps: Vec<RequestNode>,
}

impl ExecutionPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn target(&self) -> Option<&RequestNode> {
        self.steps.last()
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.steps.iter().map(|s| s.path.as_path()).collect()
    }

    /// Every `@extract` in the plan, with the step that declares it
    pub fn extractions(&self) -> impl Iterator<Item = (&Path, &Extraction)> {
        self.steps
            .iter()
            .flat_map(|s| s.extractions.iter().map(move |e| (s.path.as_path(), e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Orders the graph rooted at `target`; every dependency comes strictly
/// before its dependents.
pub fn order(graph: &DependencyGraph, target: &Path) -> Result<Vec<PathBuf>> {
    let mut marks: HashMap<PathBuf, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(graph.len());
    // (node, index of the next dependency to visit)
    let mut stack: Vec<(PathBuf, usize)> = Vec::new();

    marks.insert(target.to_path_buf(), Mark::InProgress);
    stack.push((target.to_path_buf(), 0));

    while let Some((path, next)) = stack.last_mut() {
        let node = graph
            .node(path)
            .ok_or_else(|| ReqtreeError::parse(path.as_path(), "file is not part of the dependency graph"))?;

        let Some(dependency) = node.depends_on.get(*next) else {
            marks.insert(path.clone(), Mark::Done);
            order.push(path.clone());
            stack.pop();
            continue;
        };
        *next += 1;

        match marks.get(dependency) {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                let start = stack
                    .iter()
                    .position(|(p, _)| p == dependency)
                    .unwrap_or(0);
                let mut cycle: Vec<PathBuf> = stack[start..].iter().map(|(p, _)| p.clone()).collect();
                cycle.push(dependency.clone());
                return Err(ReqtreeError::Cycle {
                    node: dependency.clone(),
                    cycle,
                });
            }
            None => {
                let dependency = dependency.clone();
                marks.insert(dependency.clone(), Mark::InProgress);
                stack.push((dependency, 0));
            }
        }
    }

    Ok(order)
}

/// Orders the graph from its own target and collects the nodes.
pub fn schedule(graph: &DependencyGraph) -> Result<ExecutionPlan> {
    let steps = order(graph, graph.target())?
        .iter()
        .filter_map(|path| graph.node(path).cloned())
        .collect();
    Ok(ExecutionPlan { steps })
}
