//! Persisted session state
//!
//! ```json
//! { "activeProfile": "dev", "variables": { "token": "abc" } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{ReqtreeError, Result};

/// Session file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    #[serde(default)]
    pub active_profile: String,
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

impl SessionFile {
    pub fn new(active_profile: impl Into<String>) -> Self {
        Self {
            active_profile: active_profile.into(),
            variables: IndexMap::new(),
        }
    }

    /// Load a session file; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ReqtreeError::Session(format!("Failed to read session: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ReqtreeError::Session(format!("Failed to parse session {}: {}", path.display(), e)))
    }

    /// Save atomically, readable only by the owner on Unix
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ReqtreeError::Session(format!("Failed to serialize session: {}", e)))?;

        crate::fs::write_atomic(path, &content, true)
            .map_err(|e| ReqtreeError::Session(format!("Failed to save session: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_disk_shape() {
        let mut session = SessionFile::new("dev");
        session.variables.insert("token".into(), "abc".into());

        let json: serde_json::Value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"activeProfile": "dev", "variables": {"token": "abc"}})
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".reqtree").join("session.json");

        let mut session = SessionFile::new("staging");
        session.variables.insert("userId".into(), "123".into());
        session.variables.insert("token".into(), "abc".into());
        session.save(&path).unwrap();

        let loaded = SessionFile::load(&path).unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.variables.keys().collect::<Vec<_>>(), vec!["userId", "token"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = SessionFile::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded, SessionFile::default());
    }

    #[test]
    fn test_corrupt_file_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(SessionFile::load(&path), Err(ReqtreeError::Session(_))));
    }

    #[test]
    fn test_partial_file_defaults() {
        let session: SessionFile = serde_json::from_str(r#"{"variables":{"a":"1"}}"#).unwrap();
        assert_eq!(session.active_profile, "");
        assert_eq!(session.variables["a"], "1");
    }
}
