//! Run settings, loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::ConfigurationError;

/// Where configuration and jobs live, and how a run behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the configuration record tree (see `DirConfigReader`).
    pub config_root: PathBuf,
    /// Active job definitions, one directory per job.
    pub jobs_root: PathBuf,
    /// Archived job definitions.
    pub archive_root: PathBuf,
    /// Maximum reconcile actions in flight.
    pub concurrency: usize,
    /// Program (plus leading args) told about every applied action.
    pub notify_command: Option<Vec<String>>,
    /// Seconds before a notify command is abandoned.
    pub notify_timeout_secs: u64,
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_root: PathBuf::from("config"),
            jobs_root: PathBuf::from("jobs"),
            archive_root: PathBuf::from("jobs-archive"),
            concurrency: 4,
            notify_command: None,
            notify_timeout_secs: 30,
            json_logs: false,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigurationError> {
        let settings: Settings = toml::from_str(text).map_err(|e| ConfigurationError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(settings.normalized())
    }

    /// Load settings from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigurationError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&text, path)
    }

    fn normalized(mut self) -> Self {
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self
            .notify_command
            .as_ref()
            .is_some_and(|command| command.is_empty())
        {
            self.notify_command = None;
        }
        self
    }
}
