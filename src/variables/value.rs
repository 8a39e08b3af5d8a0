//! Variable values stored in profiles
//!
//! A profile variable is one of three shapes:
//!
//! ```yaml
//! baseUrl: https://dev.example.com            # literal
//! region:                                     # multi-value
//!   options: [us, eu, ap]
//!   active: 1
//!   aliases: { europe: 1 }
//! otp:                                        # prompted at use time
//!   interactive: true
//!   prompt: One-time code
//!   default: "000000"
//! ```
//!
//! Numbers and booleans written as scalars are kept as literal strings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ReqtreeError, Result};

/// A named value: literal, multi-value selection, or prompted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVariable", into = "RawVariable")]
pub enum Variable {
    Literal(String),
    MultiValue(MultiValue),
    Interactive(Interactive),
}

/// Several options with one active selection.
///
/// `0 <= active < options.len()` must hold; see [`MultiValue::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiValue {
    pub options: Vec<String>,
    pub active: usize,
    pub description: Option<String>,
    /// alias name -> option index
    pub aliases: IndexMap<String, usize>,
}

/// A value that is asked for when a request is resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interactive {
    pub prompt: Option<String>,
    /// Never itself interactive.
    pub default: Option<Box<Variable>>,
}

impl Variable {
    pub fn literal(value: impl Into<String>) -> Self {
        Variable::Literal(value.into())
    }

    /// The stored value without prompting.
    ///
    /// Interactive variables yield their default, if any.
    pub fn current_value(&self, name: &str) -> Result<Option<String>> {
        match self {
            Variable::Literal(value) => Ok(Some(value.clone())),
            Variable::MultiValue(multi) => multi.active_value(name).map(|v| Some(v.to_string())),
            Variable::Interactive(interactive) => match &interactive.default {
                Some(default) => default.current_value(name),
                None => Ok(None),
            },
        }
    }

    /// Checks the multi-value invariant, including inside an interactive default.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            Variable::Literal(_) => Ok(()),
            Variable::MultiValue(multi) => multi.validate(name),
            Variable::Interactive(interactive) => match interactive.default.as_deref() {
                Some(Variable::Interactive(_)) => Err(ReqtreeError::Profile(format!(
                    "Variable '{}': an interactive default cannot itself be interactive",
                    name
                ))),
                Some(default) => default.validate(name),
                None => Ok(()),
            },
        }
    }
}

impl MultiValue {
    pub fn new(options: Vec<String>, active: usize) -> Self {
        Self {
            options,
            active,
            ..Default::default()
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.active >= self.options.len() {
            return Err(ReqtreeError::VariableRange {
                name: name.to_string(),
                active: self.active,
                len: self.options.len(),
            });
        }
        if let Some((alias, &index)) = self.aliases.iter().find(|(_, &i)| i >= self.options.len()) {
            return Err(ReqtreeError::Profile(format!(
                "Variable '{}': alias '{}' points at option {} but only {} exist",
                name,
                alias,
                index,
                self.options.len()
            )));
        }
        Ok(())
    }

    /// The option at `active`, or a range error.
    pub fn active_value(&self, name: &str) -> Result<&str> {
        self.validate(name)?;
        Ok(&self.options[self.active])
    }

    /// Selects an option by alias, by exact option text, or by index.
    pub fn select(&mut self, name: &str, choice: &str) -> Result<()> {
        let index = if let Some(&index) = self.aliases.get(choice) {
            index
        } else if let Some(index) = self.options.iter().position(|o| o == choice) {
            index
        } else if let Ok(index) = choice.parse::<usize>() {
            index
        } else {
            return Err(ReqtreeError::Profile(format!(
                "Variable '{}' has no option or alias '{}'",
                name, choice
            )));
        };

        if index >= self.options.len() {
            return Err(ReqtreeError::VariableRange {
                name: name.to_string(),
                active: index,
                len: self.options.len(),
            });
        }
        self.active = index;
        Ok(())
    }
}

// Serialized form. Variant order matters for untagged matching: the
// interactive marker is checked first, then the options list, then scalars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawVariable {
    Interactive {
        interactive: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<RawVariable>>,
    },
    Multi {
        options: Vec<String>,
        #[serde(default)]
        active: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        aliases: IndexMap<String, usize>,
    },
    Scalar(serde_json::Value),
}

impl TryFrom<RawVariable> for Variable {
    type Error = String;

    fn try_from(raw: RawVariable) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawVariable::Interactive { interactive: false, .. } => {
                Err("'interactive' must be true when present".to_string())
            }
            RawVariable::Interactive { prompt, default, .. } => {
                let default = match default {
                    Some(raw) => Some(Box::new(Variable::try_from(*raw)?)),
                    None => None,
                };
                Ok(Variable::Interactive(Interactive { prompt, default }))
            }
            RawVariable::Multi { options, active, description, aliases } => {
                Ok(Variable::MultiValue(MultiValue { options, active, description, aliases }))
            }
            RawVariable::Scalar(value) => match value {
                serde_json::Value::String(s) => Ok(Variable::Literal(s)),
                serde_json::Value::Number(n) => Ok(Variable::Literal(n.to_string())),
                serde_json::Value::Bool(b) => Ok(Variable::Literal(b.to_string())),
                serde_json::Value::Null => Ok(Variable::Literal(String::new())),
                other => Err(format!(
                    "expected a string, a multi-value table or an interactive table, found {}",
                    other
                )),
            },
        }
    }
}

impl From<Variable> for RawVariable {
    fn from(variable: Variable) -> Self {
        match variable {
            Variable::Literal(s) => RawVariable::Scalar(serde_json::Value::String(s)),
            Variable::MultiValue(m) => RawVariable::Multi {
                options: m.options,
                active: m.active,
                description: m.description,
                aliases: m.aliases,
            },
            Variable::Interactive(i) => RawVariable::Interactive {
                interactive: true,
                prompt: i.prompt,
                default: i.default.map(|d| Box::new(RawVariable::from(*d))),
            },
        }
    }
}
