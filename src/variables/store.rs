//! Layered variable store
//!
//! Two bags: `profile` (loaded from the active profile, persistent) and
//! `session` (ephemeral literals). Lookups check `session` first.
//!
//! The store performs no locking. A host running several chains against one
//! store must serialize access itself.

use indexmap::IndexMap;

use super::value::Variable;
use crate::errors::Result;

#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    profile: IndexMap<String, Variable>,
    session: IndexMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: IndexMap<String, Variable>) -> Self {
        Self {
            profile,
            session: IndexMap::new(),
        }
    }

    /// Looks a name up, session first, then profile.
    ///
    /// Multi-value variables yield their active option; an out-of-range
    /// `active` is a range error. Interactive variables
    /// yield their default without prompting.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        if let Some(value) = self.session.get(name) {
            return Ok(Some(value.clone()));
        }
        match self.profile.get(name) {
            Some(variable) => variable.current_value(name),
            None => Ok(None),
        }
    }

    /// The raw variable behind a name, session first.
    ///
    /// Session entries are always literals.
    pub fn lookup(&self, name: &str) -> Option<Variable> {
        if let Some(value) = self.session.get(name) {
            return Some(Variable::Literal(value.clone()));
        }
        self.profile.get(name).cloned()
    }

    pub fn set_session(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.session.insert(name.into(), value.into());
    }

    pub fn remove_session(&mut self, name: &str) -> Option<String> {
        self.session.shift_remove(name)
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    /// Fails with a range error if `name` is a multi-value whose `active`
    /// index is out of bounds. Unknown names and literals are valid.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self.profile.get(name) {
            Some(variable) => variable.validate(name),
            None => Ok(()),
        }
    }

    pub fn validate_all(&self) -> Result<()> {
        for (name, variable) in &self.profile {
            variable.validate(name)?;
        }
        Ok(())
    }

    /// Replaces the profile bag. The session is left alone; profile
    /// switches go through the workspace, which clears it.
    pub fn load_profile(&mut self, profile: IndexMap<String, Variable>) {
        self.profile = profile;
    }

    pub fn load_session(&mut self, session: IndexMap<String, String>) {
        self.session = session;
    }

    pub fn session(&self) -> &IndexMap<String, String> {
        &self.session
    }

    pub fn profile(&self) -> &IndexMap<String, Variable> {
        &self.profile
    }

    /// Names visible through [`get`](Self::get), session names first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.session.keys().map(String::as_str).collect();
        for name in self.profile.keys() {
            if !self.session.contains_key(name) {
                names.push(name);
            }
        }
        names
    }
}
