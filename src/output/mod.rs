//! Rendering plans, responses and variables for the terminal

pub mod terminal;

use std::collections::HashSet;
use std::path::Path;

use crate::chain::{ChainObserver, ExecutionPlan, RequestNode};
use crate::client::ExecutionResult;
use crate::context::Workspace;
use crate::errors::ShellError;
use crate::variables::resolver::placeholder_names;
use crate::variables::{Variable, VariableStore};

pub use terminal::Painter;

/// `path` relative to `base` when it lies below it
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}

/// The execution order with each step's extractions and the placeholders
/// that nothing defines by the time the step runs.
pub fn render_plan(plan: &ExecutionPlan, store: &VariableStore, base: &Path, painter: &Painter) -> String {
    let mut out = String::new();
    let mut available: HashSet<String> = store.names().into_iter().map(String::from).collect();

    out.push_str(&format!("{} ({} steps):\n", painter.label("Execution Order"), plan.len()));

    for (i, step) in plan.steps.iter().enumerate() {
        let request = &step.request;
        out.push_str(&format!(
            "  {}. {}  {} {}\n",
            i + 1,
            painter.label(&display_path(&step.path, base)),
            painter.http_method(&request.method),
            request.url
        ));

        let mut used = placeholder_names(&request.url);
        for value in request.headers.values() {
            used.extend(placeholder_names(value));
        }
        if let Some(body) = &request.body {
            used.extend(placeholder_names(body));
        }
        let mut seen = HashSet::new();
        let unset: Vec<String> = used
            .into_iter()
            .filter(|n| !available.contains(n) && seen.insert(n.clone()))
            .collect();
        if !unset.is_empty() {
            out.push_str(&format!(
                "       {} {}\n",
                painter.warning("unset:"),
                unset.join(", ")
            ));
        }

        for extraction in &step.extractions {
            out.push_str(&format!(
                "       {} {} {} {}\n",
                painter.muted("@extract"),
                painter.key(&extraction.variable),
                painter.muted("<-"),
                extraction.expression
            ));
            available.insert(extraction.variable.clone());
        }
    }

    out
}

/// Status line, headers, then the body (pretty-printed when it is JSON).
pub fn render_response(result: &ExecutionResult, painter: &Painter) -> String {
    let mut out = format!(
        "{} {} {}\n",
        painter.label("HTTP"),
        painter.http_status(result.status),
        painter.muted(&format!("({} ms)", result.duration_ms))
    );
    for (name, value) in &result.headers {
        out.push_str(&format!("{}: {}\n", painter.key(name), value));
    }
    if !result.body.is_empty() {
        out.push('\n');
        let pretty = serde_json::from_str::<serde_json::Value>(&result.body)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok());
        out.push_str(pretty.as_deref().unwrap_or(&result.body));
        out.push('\n');
    }
    out
}

/// Session variables, then profile variables not shadowed by them.
pub fn render_variables(store: &VariableStore, painter: &Painter) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}:\n", painter.label("Session")));
    if store.session().is_empty() {
        out.push_str(&format!("  {}\n", painter.muted("(none)")));
    }
    for (name, value) in store.session() {
        out.push_str(&format!("  {} = {}\n", painter.key(name), painter.value(value)));
    }

    out.push_str(&format!("{}:\n", painter.label("Profile")));
    if store.profile().is_empty() {
        out.push_str(&format!("  {}\n", painter.muted("(none)")));
    }
    for (name, variable) in store.profile() {
        let shadowed = store.session().contains_key(name);
        let text = describe_variable(variable);
        let line = if shadowed {
            painter.muted(&format!("{} = {} (shadowed)", name, text))
        } else {
            format!("{} = {}", painter.key(name), painter.value(&text))
        };
        out.push_str(&format!("  {}\n", line));
    }

    out
}

fn describe_variable(variable: &Variable) -> String {
    match variable {
        Variable::Literal(value) => value.clone(),
        Variable::MultiValue(multi) => multi
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| if i == multi.active { format!("[{}]", o) } else { o.clone() })
            .collect::<Vec<_>>()
            .join(" | "),
        Variable::Interactive(interactive) => match interactive.default.as_deref() {
            Some(default) => format!("(prompted, default {})", describe_variable(default)),
            None => "(prompted)".to_string(),
        },
    }
}

/// Profile names with the active one marked
pub fn render_profiles(workspace: &Workspace, painter: &Painter) -> String {
    workspace
        .profiles()
        .names()
        .map(|name| {
            if name == workspace.active_profile() {
                format!("* {}\n", painter.success(name))
            } else {
                format!("  {}\n", name)
            }
        })
        .collect()
}

/// Prints chain progress to stderr.
pub struct ProgressObserver {
    painter: Painter,
    base: std::path::PathBuf,
    verbose: bool,
}

impl ProgressObserver {
    pub fn new(base: impl Into<std::path::PathBuf>, verbose: bool) -> Self {
        Self {
            painter: Painter::for_stderr(),
            base: base.into(),
            verbose,
        }
    }
}

impl ChainObserver for ProgressObserver {
    fn on_step_start(&self, index: usize, total: usize, node: &RequestNode) {
        if self.verbose {
            eprintln!(
                "{} {} {}",
                self.painter.muted(&format!("[{}/{}]", index + 1, total)),
                self.painter.label("Running:"),
                display_path(&node.path, &self.base)
            );
        }
    }

    fn on_step_finish(&self, _index: usize, _total: usize, _node: &RequestNode, result: &ExecutionResult) {
        if self.verbose {
            eprintln!(
                "      {} {}",
                self.painter.http_status(result.status),
                self.painter.muted(&format!("({} ms)", result.duration_ms))
            );
        }
    }

    fn on_extracted(&self, _node: &RequestNode, variable: &str, value: &str) {
        if self.verbose {
            eprintln!("      {} = {}", self.painter.key(variable), self.painter.value(value));
        }
    }

    fn on_warning(&self, node: &RequestNode, warning: &ShellError) {
        eprintln!(
            "{} {}: {}",
            self.painter.warning("warning:"),
            display_path(&node.path, &self.base),
            warning
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Extraction;
    use crate::requests::RequestDefinition;
    use crate::variables::MultiValue;
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn plain() -> Painter {
        Painter::new(false)
    }

    fn node(name: &str, url: &str, extractions: Vec<(&str, &str)>) -> RequestNode {
        RequestNode {
            path: PathBuf::from(format!("/ws/{}", name)),
            request: RequestDefinition::new("GET", url),
            depends_on: vec![],
            extractions: extractions
                .into_iter()
                .map(|(v, e)| Extraction { variable: v.into(), expression: e.into() })
                .collect(),
        }
    }

    #[test]
    fn test_render_plan_marks_unset_placeholders() {
        let plan = ExecutionPlan {
            steps: vec![
                node("login.http", "{{baseUrl}}/login", vec![("token", "access_token")]),
                node("me.http", "{{baseUrl}}/me?t={{token}}&x={{other}}", vec![]),
            ],
        };
        let mut store = VariableStore::new();
        store.set_session("baseUrl", "https://x.test");

        let text = render_plan(&plan, &store, Path::new("/ws"), &plain());
        assert!(text.contains("Execution Order (2 steps):"));
        assert!(text.contains("1. login.http  GET {{baseUrl}}/login"));
        assert!(text.contains("@extract token <- access_token"));
        assert!(text.contains("unset: other"));
        assert!(!text.contains("unset: token"));
    }

    #[test]
    fn test_render_response_pretty_json() {
        let result = ExecutionResult {
            status: 200,
            headers: vec![("content-type".into(), "application/json".into())],
            body: r#"{"a":1}"#.into(),
            duration_ms: 7,
            error: None,
        };
        let text = render_response(&result, &plain());
        assert!(text.starts_with("HTTP 200 (7 ms)\n"));
        assert!(text.contains("content-type: application/json"));
        assert!(text.contains("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_render_variables() {
        let mut profile = IndexMap::new();
        profile.insert("env".to_string(), Variable::MultiValue(MultiValue::new(vec!["dev".into(), "prod".into()], 1)));
        profile.insert("token".to_string(), Variable::literal("from-profile"));
        let mut store = VariableStore::with_profile(profile);
        store.set_session("token", "abc");

        let text = render_variables(&store, &plain());
        assert!(text.contains("token = abc"));
        assert!(text.contains("env = dev | [prod]"));
        assert!(text.contains("token = from-profile (shadowed)"));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path(Path::new("/ws/a/b.http"), Path::new("/ws")), "a/b.http");
        assert_eq!(display_path(Path::new("/other/b.http"), Path::new("/ws")), "/other/b.http");
    }
}
