//! Text resolution: shell fragments and `{{name}}` placeholders
//!
//! Three passes over the same string:
//!
//! 1. every `$(command)` fragment is replaced by the command's trimmed stdout
//! 2. every `{{name}}` is replaced from the variable store
//! 3. pass 1 again, for commands that came out of a variable's value
//!
//! A failing command leaves its fragment in place and is reported as a
//! warning on the [`Resolution`]. An unknown placeholder is left as-is.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::prompt::Prompter;
use super::shell::{find_fragments, ShellRunner};
use super::store::VariableStore;
use super::value::{Interactive, Variable};
use crate::errors::{ReqtreeError, Result, ShellError};
use crate::requests::RequestDefinition;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("Failed to compile placeholder regex")
});

/// Names of the `{{name}}` placeholders in `text`, in order, without duplicates.
pub fn placeholder_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

/// A resolved value plus any shell failures met on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub value: T,
    /// Every failed substitution, in the order it was attempted
    pub warnings: Vec<ShellError>,
}

impl<T> Resolution<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn last_warning(&self) -> Option<&ShellError> {
        self.warnings.last()
    }
}

/// Resolves placeholders and shell fragments against a [`VariableStore`].
#[derive(Clone, Default)]
pub struct TextResolver {
    shell: ShellRunner,
    prompter: Option<Arc<dyn Prompter>>,
}

/// Per-call state: prompt answers are reused across the fields of one
/// request, and commands that already failed are not re-run.
#[derive(Default)]
struct Pass {
    answers: HashMap<String, String>,
    failed: HashSet<String>,
    warnings: Vec<ShellError>,
}

impl TextResolver {
    pub fn new(shell: ShellRunner) -> Self {
        Self {
            shell,
            prompter: None,
        }
    }

    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    pub fn shell(&self) -> &ShellRunner {
        &self.shell
    }

    /// Resolves a single string.
    ///
    /// Errors only on cancellation or a multi-value variable whose active
    /// index is out of range; shell failures are warnings.
    pub async fn resolve(
        &self,
        text: &str,
        store: &VariableStore,
        cancel: &CancellationToken,
    ) -> Result<Resolution<String>> {
        let mut pass = Pass::default();
        let value = self.resolve_in(text, store, cancel, &mut pass).await?;
        Ok(Resolution {
            value,
            warnings: pass.warnings,
        })
    }

    /// Resolves the URL, every header value and the body into a new request.
    /// The input is left untouched.
    pub async fn resolve_request(
        &self,
        request: &RequestDefinition,
        store: &VariableStore,
        cancel: &CancellationToken,
    ) -> Result<Resolution<RequestDefinition>> {
        let mut pass = Pass::default();

        let url = self.resolve_in(&request.url, store, cancel, &mut pass).await?;

        let mut headers = IndexMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let resolved = self.resolve_in(value, store, cancel, &mut pass).await?;
            headers.insert(name.clone(), resolved);
        }

        let body = match &request.body {
            Some(body) => Some(self.resolve_in(body, store, cancel, &mut pass).await?),
            None => None,
        };

        Ok(Resolution {
            value: RequestDefinition {
                url,
                headers,
                body,
                ..request.clone()
            },
            warnings: pass.warnings,
        })
    }

    async fn resolve_in(
        &self,
        text: &str,
        store: &VariableStore,
        cancel: &CancellationToken,
        pass: &mut Pass,
    ) -> Result<String> {
        let text = self.substitute_shell(text, cancel, pass).await?;
        let text = self.substitute_placeholders(&text, store, cancel, pass).await?;
        self.substitute_shell(&text, cancel, pass).await
    }

    async fn substitute_shell(
        &self,
        text: &str,
        cancel: &CancellationToken,
        pass: &mut Pass,
    ) -> Result<String> {
        let fragments = find_fragments(text);
        if fragments.is_empty() {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        for fragment in fragments {
            result.push_str(&text[last..fragment.start]);
            last = fragment.end;

            if pass.failed.contains(&fragment.command) {
                result.push_str(&text[fragment.start..fragment.end]);
                continue;
            }

            match self.shell.run(&fragment.command, cancel).await {
                Ok(output) => result.push_str(&output),
                Err(ReqtreeError::Shell(err)) => {
                    warn!(command = %err.command, reason = %err.reason, "Shell substitution failed");
                    pass.failed.insert(fragment.command.clone());
                    pass.warnings.push(err);
                    result.push_str(&text[fragment.start..fragment.end]);
                }
                Err(other) => return Err(other),
            }
        }

        result.push_str(&text[last..]);
        Ok(result)
    }

    async fn substitute_placeholders(
        &self,
        text: &str,
        store: &VariableStore,
        cancel: &CancellationToken,
        pass: &mut Pass,
    ) -> Result<String> {
        if !text.contains("{{") {
            return Ok(text.to_string());
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;

        let found: Vec<_> = PLACEHOLDER_RE
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str())))
            .collect();

        for (whole, name) in found {
            result.push_str(&text[last..whole.start]);
            last = whole.end;

            match self.value_of(name, store, cancel, pass).await? {
                Some(value) => result.push_str(&value),
                None => {
                    debug!(name, "Leaving undefined placeholder in place");
                    result.push_str(&text[whole]);
                }
            }
        }

        result.push_str(&text[last..]);
        Ok(result)
    }

    async fn value_of(
        &self,
        name: &str,
        store: &VariableStore,
        cancel: &CancellationToken,
        pass: &mut Pass,
    ) -> Result<Option<String>> {
        match store.lookup(name) {
            None => Ok(None),
            Some(Variable::Interactive(interactive)) => {
                if let Some(answer) = pass.answers.get(name) {
                    return Ok(Some(answer.clone()));
                }
                if let Some(answer) = self.ask(name, &interactive, cancel).await? {
                    pass.answers.insert(name.to_string(), answer.clone());
                    return Ok(Some(answer));
                }
                Variable::Interactive(interactive).current_value(name)
            }
            Some(variable) => variable.current_value(name),
        }
    }

    /// Runs the prompter on the blocking pool, since terminal prompts wait
    /// on user input.
    async fn ask(
        &self,
        name: &str,
        variable: &Interactive,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let Some(prompter) = self.prompter.clone() else {
            return Ok(None);
        };
        let (asked, variable) = (name.to_string(), variable.clone());
        let task = tokio::task::spawn_blocking(move || prompter.prompt(&asked, &variable));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ReqtreeError::Cancelled),
            joined = task => Ok(joined.unwrap_or_else(|e| {
                warn!(name, error = %e, "Prompt task failed");
                None
            })),
        }
    }
}
