//! Prompting for interactive variables

use dialoguer::{Input, Select};

use super::value::{Interactive, Variable};

/// Asks the user for an interactive variable's value.
///
/// Returning `None` falls back to the variable's default. Called on the
/// blocking thread pool, so implementations may wait on the terminal.
pub trait Prompter: Send + Sync {
    fn prompt(&self, name: &str, variable: &Interactive) -> Option<String>;
}

/// Prompts on the terminal (stderr), pre-filling the default.
///
/// A multi-value default is offered as a selection list.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&self, name: &str, variable: &Interactive) -> Option<String> {
        let message = variable.prompt.clone().unwrap_or_else(|| name.to_string());

        match variable.default.as_deref() {
            Some(Variable::MultiValue(multi)) if !multi.options.is_empty() => {
                let default = multi.active.min(multi.options.len() - 1);
                Select::new()
                    .with_prompt(message)
                    .items(&multi.options)
                    .default(default)
                    .interact()
                    .ok()
                    .map(|i| multi.options[i].clone())
            }
            Some(Variable::Literal(default)) => Input::<String>::new()
                .with_prompt(message)
                .default(default.clone())
                .interact_text()
                .ok(),
            _ => Input::<String>::new()
                .with_prompt(message)
                .allow_empty(true)
                .interact_text()
                .ok(),
        }
    }
}
