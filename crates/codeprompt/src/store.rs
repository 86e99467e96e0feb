use crate::prelude::*;
use codeprompt_core::session::Session;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON file holding the session between invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `--session`, or `session.json` in the user data directory.
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        if let Some(path) = &global.session {
            return Ok(Self::new(path));
        }

        let dir = dirs_next::data_dir()
            .ok_or_else(|| eyre!("Unable to determine data directory"))?
            .join("codeprompt");

        Ok(Self::new(dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the session; a missing file is an empty session.
    pub fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            log::debug!("No session at {}, starting fresh", self.path.display());
            return Ok(Session::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let session = serde_json::from_str(&contents).map_err(|e| self.error(e))?;
        Ok(session)
    }

    /// Write the session through a temporary file and an atomic rename.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(session).map_err(|e| self.error(e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        log::debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    /// Load, mutate and save in one step. Nothing is written if `apply` fails.
    pub fn update<T>(&self, apply: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut session = self.load()?;
        let value = apply(&mut session)?;
        self.save(&session)?;
        Ok(value)
    }

    fn error(&self, err: impl std::fmt::Display) -> Error {
        Error::SessionStore {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}
