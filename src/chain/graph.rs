//! Dependency graph of request files
//!
//! Built from one target file by following `@depends` edges. Files are
//! parsed once each; nodes keep the order in which they were discovered.

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::annotations::{self, Extraction};
use crate::errors::{ReqtreeError, Result};
use crate::requests::{FileParser, RequestDefinition};

/// One request file taking part in a chain
#[derive(Debug, Clone, PartialEq)]
pub struct RequestNode {
    /// Normalized absolute path; the node's identity
    pub path: PathBuf,
    /// First request definition in the file
    pub request: RequestDefinition,
    /// Normalized paths of the files this one depends on, in declaration order
    pub depends_on: Vec<PathBuf>,
    pub extractions: Vec<Extraction>,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    target: PathBuf,
    nodes: IndexMap<PathBuf, RequestNode>,
}

impl DependencyGraph {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn node(&self, path: &Path) -> Option<&RequestNode> {
        self.nodes.get(path)
    }

    /// Nodes in discovery order, target first
    pub fn nodes(&self) -> impl Iterator<Item = &RequestNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_nodes(target: &Path, nodes: Vec<RequestNode>) -> Self {
        Self {
            target: target.to_path_buf(),
            nodes: nodes.into_iter().map(|n| (n.path.clone(), n)).collect(),
        }
    }
}

/// Builds a [`DependencyGraph`], resolving relative paths against `base_dir`.
pub struct GraphBuilder<'a> {
    parser: &'a dyn FileParser,
    base_dir: PathBuf,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(parser: &'a dyn FileParser, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            base_dir: base_dir.into(),
        }
    }

    /// Normalizes `path` against the base directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize(&self.base_dir.join(path))
    }

    /// Parses `target` and every file reachable through `@depends`.
    ///
    /// Any file that is missing or fails to parse aborts the build with an
    /// error naming that file.
    pub fn build(&self, target: impl AsRef<Path>) -> Result<DependencyGraph> {
        let target = self.resolve_path(target);
        let mut nodes: IndexMap<PathBuf, RequestNode> = IndexMap::new();
        let mut queue: VecDeque<(PathBuf, Option<PathBuf>)> = VecDeque::new();
        queue.push_back((target.clone(), None));

        while let Some((path, required_by)) = queue.pop_front() {
            if nodes.contains_key(&path) {
                continue;
            }

            if !path.is_file() {
                let message = match required_by {
                    Some(parent) => format!("dependency not found (required by {})", parent.display()),
                    None => "file not found".to_string(),
                };
                return Err(ReqtreeError::parse(&path, message));
            }

            let node = self.parse_node(&path)?;
            debug!(path = %path.display(), depends = node.depends_on.len(), extracts = node.extractions.len(), "Parsed request node");

            for dependency in &node.depends_on {
                if !nodes.contains_key(dependency) {
                    queue.push_back((dependency.clone(), Some(path.clone())));
                }
            }
            nodes.insert(path, node);
        }

        Ok(DependencyGraph { target, nodes })
    }

    fn parse_node(&self, path: &Path) -> Result<RequestNode> {
        let parsed = self.parser.parse(path)?;
        let request = parsed.primary()?.clone();
        let annotations = annotations::scan(path, &parsed.comments)?;

        Ok(RequestNode {
            path: path.to_path_buf(),
            request,
            depends_on: annotations
                .depends
                .iter()
                .map(|d| self.resolve_path(d))
                .collect(),
            extractions: annotations.extractions,
        })
    }
}

/// Lexically removes `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
