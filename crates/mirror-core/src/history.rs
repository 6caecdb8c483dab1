//! Durable run history
//!
//! Persists a bounded, ordered log of orchestration runs (not individual
//! file actions) as a single JSON document. Every write serializes the full
//! list to a temporary location and moves it into place as one indivisible
//! replace, so a reader never observes a partially written store. Read
//! failures degrade to an empty history: the ledger is best-effort, never
//! authoritative.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sync::ReplicaOutcome;

/// Entries kept before the oldest are evicted, FIFO.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Kind of run recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Sync,
    DryRun,
}

/// Terminal status of a recorded run.
///
/// Cancellation is unsupported, so a run always ends in one of these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    Failed,
}

/// Immutable record of one completed orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    /// Run completion time, UTC
    pub timestamp: DateTime<Utc>,
    pub sync_type: SyncType,
    pub status: SyncStatus,
    /// Run duration in seconds
    pub duration: f64,
    pub library_path: String,
    pub replica_paths: Vec<String>,
    /// Per-replica outcome keyed by replica path
    pub results: BTreeMap<String, ReplicaOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate summary of the history ledger.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub total_syncs: usize,
    pub successful_syncs: usize,
    pub failed_syncs: usize,
    pub last_sync: Option<SyncHistoryEntry>,
    /// Mean duration over completed runs only, zero when none exist
    pub average_duration: f64,
}

/// On-disk envelope of the history store.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    last_updated: DateTime<Utc>,
    total_entries: usize,
    entries: Vec<SyncHistoryEntry>,
}

/// Append-only history ledger with bounded retention.
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Override the retention cap.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, evicting the oldest beyond the retention cap.
    ///
    /// The full list is rewritten and moved into place atomically. Callers
    /// treat failures as best-effort: the in-memory run result stays
    /// authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryStore`] if the store cannot be written.
    pub fn append(&self, entry: SyncHistoryEntry) -> Result<()> {
        let mut entries = self.load_entries();
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }
        self.save_entries(entries)
    }

    /// List entries, most recent first, up to `limit`.
    pub fn list(&self, limit: Option<usize>) -> Vec<SyncHistoryEntry> {
        let mut entries = self.load_entries();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// The most recent entry, or None when the history is empty.
    pub fn latest(&self) -> Option<SyncHistoryEntry> {
        self.list(Some(1)).into_iter().next()
    }

    /// Aggregate summary over the persisted log.
    pub fn stats(&self) -> HistoryStats {
        let entries = self.load_entries();

        let successful: Vec<&SyncHistoryEntry> = entries
            .iter()
            .filter(|e| e.status == SyncStatus::Completed)
            .collect();
        let failed_syncs = entries
            .iter()
            .filter(|e| e.status == SyncStatus::Failed)
            .count();

        let average_duration = if successful.is_empty() {
            0.0
        } else {
            let mean: f64 =
                successful.iter().map(|e| e.duration).sum::<f64>() / successful.len() as f64;
            (mean * 100.0).round() / 100.0
        };

        HistoryStats {
            total_syncs: entries.len(),
            successful_syncs: successful.len(),
            failed_syncs,
            last_sync: entries.iter().max_by_key(|e| e.timestamp).cloned(),
            average_duration,
        }
    }

    /// Delete the persisted store; subsequent queries return empty results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryStore`] if the file exists but cannot be
    /// removed.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| Error::HistoryStore {
                message: format!("failed to clear history: {e}"),
            })?;
        }
        info!("Sync history cleared");
        Ok(())
    }

    /// Read the persisted log; corrupt or missing stores degrade to empty.
    fn load_entries(&self) -> Vec<SyncHistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }
        match self.read_document() {
            Ok(document) => document.entries,
            Err(e) => {
                warn!("Failed to load sync history: {}", e);
                Vec::new()
            }
        }
    }

    /// Read through a shared-locked handle to avoid racing a concurrent
    /// replace from another process.
    fn read_document(&self) -> Result<HistoryDocument> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        let document: HistoryDocument = serde_json::from_str(&content)?;

        // Lock released when file is dropped
        Ok(document)
    }

    fn save_entries(&self, entries: Vec<SyncHistoryEntry>) -> Result<()> {
        let count = entries.len();
        let document = HistoryDocument {
            last_updated: Utc::now(),
            total_entries: count,
            entries,
        };
        let content = serde_json::to_vec_pretty(&document)?;

        mirror_fs::io::write_atomic(&self.path, &content).map_err(|e| Error::HistoryStore {
            message: e.to_string(),
        })?;

        debug!("Saved sync history with {} entries", count);
        Ok(())
    }
}
