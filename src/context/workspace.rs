//! The application root: profiles, the variable store and the session file

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{ReqtreeError, Result};
use crate::profiles::{Profile, ProfileSet};
use crate::sessions::SessionFile;
use crate::variables::VariableStore;

/// A directory of request files plus its profiles and session state.
///
/// Owns the one [`VariableStore`] every chain in the workspace runs against.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
    profiles_path: PathBuf,
    session_path: PathBuf,
    profiles: ProfileSet,
    active: String,
    store: VariableStore,
}

impl Workspace {
    /// Loads profiles and the persisted session for `root`.
    ///
    /// If the persisted profile no longer exists the default profile is
    /// activated with an empty session.
    pub fn open(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let root = root.into();
        let profiles_path = config.profiles_path(&root);
        let session_path = config.session_path(&root);

        let profiles = ProfileSet::load(&profiles_path)?;
        let session = SessionFile::load(&session_path)?;

        let (active, variables) = if session.active_profile.is_empty() {
            (profiles.default_name().to_string(), session.variables)
        } else if profiles.contains(&session.active_profile) {
            (session.active_profile, session.variables)
        } else {
            warn!(
                profile = %session.active_profile,
                "Saved profile no longer exists, switching to the default profile"
            );
            (profiles.default_name().to_string(), IndexMap::new())
        };

        let mut store = VariableStore::with_profile(
            profiles.get(&active).map(|p| p.variables.clone()).unwrap_or_default(),
        );
        store.load_session(variables);

        debug!(root = %root.display(), profile = %active, "Opened workspace");

        Ok(Self {
            root,
            config,
            profiles_path,
            session_path,
            profiles,
            active,
            store,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn profiles_path(&self) -> &Path {
        &self.profiles_path
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn active_profile(&self) -> &str {
        &self.active
    }

    /// The active profile's definition
    pub fn profile(&self) -> Option<&Profile> {
        self.profiles.get(&self.active)
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// Base directory for relative request and `@depends` paths
    pub fn working_dir(&self) -> PathBuf {
        match self.profile() {
            Some(profile) => profile.working_dir(&self.root),
            None => self.root.clone(),
        }
    }

    /// Headers the active profile adds to every request
    pub fn default_headers(&self) -> IndexMap<String, String> {
        self.profile().map(|p| p.headers.clone()).unwrap_or_default()
    }

    /// Activates `name`, wipes the session and persists.
    ///
    /// Switching to the profile that is already active changes nothing.
    pub fn switch_profile(&mut self, name: &str) -> Result<()> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ReqtreeError::Profile(format!("Unknown profile '{}'", name)))?;

        if name == self.active {
            return Ok(());
        }

        self.store.load_profile(profile.variables.clone());
        self.store.clear_session();
        info!(from = %self.active, to = %name, "Switched profile");
        self.active = name.to_string();
        self.persist()
    }

    /// Selects a multi-value option in the active profile and saves the
    /// profiles file.
    pub fn select(&mut self, variable: &str, option: &str) -> Result<()> {
        self.profiles.select(&self.active, variable, option)?;
        self.profiles.save(&self.profiles_path)?;
        if let Some(profile) = self.profiles.get(&self.active) {
            self.store.load_profile(profile.variables.clone());
        }
        Ok(())
    }

    /// Writes the active profile name and session variables to disk.
    pub fn persist(&self) -> Result<()> {
        let session = SessionFile {
            active_profile: self.active.clone(),
            variables: self.store.session().clone(),
        };
        session.save(&self.session_path)
    }
}
