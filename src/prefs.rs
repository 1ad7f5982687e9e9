//! Local console preferences, persisted as JSON.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to access preferences: {0}")]
    Io(#[from] io::Error),

    #[error("invalid preferences file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Whether Google Alerts ingestion is shown as enabled in the console.
    #[serde(default)]
    pub google_alerts_enabled: bool,
}

impl Preferences {
    /// Load preferences; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Flip the Google Alerts flag and return the new value.
    pub fn toggle_google_alerts(&mut self) -> bool {
        self.google_alerts_enabled = !self.google_alerts_enabled;
        self.google_alerts_enabled
    }
}
