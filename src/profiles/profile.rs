//! Profile definitions file
//!
//! ```yaml
//! default: dev
//! profiles:
//!   dev:
//!     working_dir: api
//!     headers:
//!       X-Env: dev
//!     variables:
//!       baseUrl: https://dev.example.com
//!       region: { options: [us, eu, ap], active: 1, aliases: { europe: 1 } }
//! ```
//!
//! YAML or TOML, chosen by extension.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{ReqtreeError, Result};
use crate::variables::Variable;

/// Name of the profile used when none is defined
pub const DEFAULT_PROFILE: &str = "default";

/// A named bundle of variables, headers and a working directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Relative to the workspace root unless absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Added to every request that does not set them itself
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
}

impl Profile {
    /// Base directory for request paths under this profile
    pub fn working_dir(&self, root: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

/// Every profile in a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub profiles: IndexMap<String, Profile>,
}

impl ProfileSet {
    /// Loads and validates the profiles file. A missing file yields one empty
    /// profile named `default`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No profiles file, using an empty default profile");
            return Ok(Self::implicit());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ReqtreeError::Profile(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut set = Self::parse(&content, path)?;
        if set.profiles.is_empty() {
            set.profiles.insert(DEFAULT_PROFILE.to_string(), Profile::default());
        }
        Ok(set)
    }

    /// Parses profiles in the format implied by `path`'s extension.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let set: Self = match Format::of(path) {
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| {
                ReqtreeError::Profile(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Format::Toml => toml::from_str(content).map_err(|e| {
                ReqtreeError::Profile(format!("Failed to parse {}: {}", path.display(), e))
            })?,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match Format::of(path) {
            Format::Yaml => serde_yaml::to_string(self)?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| ReqtreeError::Profile(format!("Failed to serialize profiles: {}", e)))?,
        };
        crate::fs::write_atomic(path, &content, false)
            .map_err(|e| ReqtreeError::Profile(format!("Failed to save {}: {}", path.display(), e)))
    }

    fn implicit() -> Self {
        let mut profiles = IndexMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), Profile::default());
        Self {
            default: None,
            profiles,
        }
    }

    /// Checks every multi-value's active index and aliases.
    pub fn validate(&self) -> Result<()> {
        if let Some(default) = &self.default {
            if !self.profiles.contains_key(default) {
                return Err(ReqtreeError::Profile(format!(
                    "Default profile '{}' is not defined",
                    default
                )));
            }
        }
        for (name, profile) in &self.profiles {
            for (var_name, variable) in &profile.variables {
                variable.validate(var_name).map_err(|e| match e {
                    ReqtreeError::Profile(msg) => ReqtreeError::Profile(format!("{} (profile '{}')", msg, name)),
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// The declared default, else the first profile, else `default`
    pub fn default_name(&self) -> &str {
        self.default
            .as_deref()
            .filter(|d| self.profiles.contains_key(*d))
            .or_else(|| self.profiles.keys().next().map(String::as_str))
            .unwrap_or(DEFAULT_PROFILE)
    }

    /// Selects a multi-value option by index, alias or option text.
    pub fn select(&mut self, profile: &str, variable: &str, option: &str) -> Result<()> {
        let entry = self
            .profiles
            .get_mut(profile)
            .ok_or_else(|| ReqtreeError::Profile(format!("Unknown profile '{}'", profile)))?;

        match entry.variables.get_mut(variable) {
            Some(Variable::MultiValue(multi)) => multi.select(variable, option),
            Some(_) => Err(ReqtreeError::Profile(format!(
                "Variable '{}' in profile '{}' is not a multi-value variable",
                variable, profile
            ))),
            None => Err(ReqtreeError::Profile(format!(
                "Variable '{}' is not defined in profile '{}'",
                variable, profile
            ))),
        }
    }
}
