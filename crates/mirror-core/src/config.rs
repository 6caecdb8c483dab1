//! Process settings for Library Mirror
//!
//! Settings come from a TOML file or from raw values handed in by the
//! front-end (flags or environment). Validation is fatal at startup: a run
//! can never be triggered with an empty library path or replica list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::history;

/// Validated process settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root of the content library (source of truth)
    pub library_path: PathBuf,
    /// Replica roots the library is mirrored to
    pub replica_paths: Vec<PathBuf>,
    /// Where run history is persisted
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// FIFO cap on persisted history entries
    #[serde(default = "default_max_history_entries")]
    pub max_history_entries: usize,
}

impl Settings {
    /// Build settings from raw values, e.g. command-line flags or
    /// environment variables.
    ///
    /// `replicas` is a comma-separated list; entries are trimmed and empty
    /// entries dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the library path is empty or the replica
    /// list is empty after trimming.
    pub fn from_parts(library_path: &str, replicas: &str, history_path: Option<&str>) -> Result<Self> {
        Self {
            library_path: PathBuf::from(library_path.trim()),
            replica_paths: parse_replica_list(replicas),
            history_path: history_path
                .map(PathBuf::from)
                .unwrap_or_else(default_history_path),
            max_history_entries: default_max_history_entries(),
        }
        .validated()
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparseable, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validated()
    }

    /// Whether the library root currently exists.
    pub fn library_exists(&self) -> bool {
        self.library_path.exists()
    }

    fn validated(mut self) -> Result<Self> {
        if self.library_path.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "library_path cannot be empty".to_string(),
            });
        }
        if self.replica_paths.is_empty() {
            return Err(Error::Config {
                message: "replica_paths cannot be empty".to_string(),
            });
        }

        // Canonicalize the library root when it exists so logs and history
        // entries show one stable spelling of the path.
        if let Ok(canonical) = dunce::canonicalize(&self.library_path) {
            self.library_path = canonical;
        }

        Ok(self)
    }
}

/// Parse a comma-separated replica list, trimming entries and dropping
/// empties.
pub fn parse_replica_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn default_history_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("library-mirror")
        .join("sync_history.json")
}

fn default_max_history_entries() -> usize {
    history::DEFAULT_MAX_ENTRIES
}
