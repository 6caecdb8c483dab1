//! SyncEngine implementation
//!
//! The engine coordinates one full replication pass: catalog the source
//! once, then reconcile and apply against each configured replica
//! independently.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::catalog::{Catalog, build_catalog};
use crate::config::Settings;
use crate::error::{Error, Result};

use super::executor::{Executor, RunStats};
use super::reconcile::{SyncRules, reconcile};

/// Options for a replication run
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// If true, simulate changes without modifying the filesystem
    pub dry_run: bool,
}

/// Result of one replica's processing within a run: its statistics, or the
/// error that made the whole replica fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplicaOutcome {
    Stats(RunStats),
    Failed { error: String },
}

/// Health probe result for the request-handling layer.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Whether the library root exists and is a directory
    pub library_accessible: bool,
    /// Whether a trivial listing of the library root succeeds
    pub library_listable: bool,
    /// Number of configured replica targets
    pub replica_count: usize,
}

/// Engine for replicating the library to its configured replicas
///
/// One engine instance holds the resolved source and replica roots plus the
/// replication rules. A single `sync_all` call is one run.
pub struct SyncEngine {
    library_path: PathBuf,
    replica_paths: Vec<PathBuf>,
    rules: SyncRules,
}

impl SyncEngine {
    /// Create an engine from validated settings with the library defaults.
    pub fn new(settings: &Settings) -> Self {
        Self {
            library_path: settings.library_path.clone(),
            replica_paths: settings.replica_paths.clone(),
            rules: SyncRules::library_defaults(),
        }
    }

    /// Replace the replication rules.
    pub fn with_rules(mut self, rules: SyncRules) -> Self {
        self.rules = rules;
        self
    }

    /// Get the library root path.
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Get the configured replica roots.
    pub fn replica_paths(&self) -> &[PathBuf] {
        &self.replica_paths
    }

    /// Replicate the library to every configured replica.
    ///
    /// The source catalog is built once and shared, so every replica sees a
    /// single conceptual snapshot taken at run start. A failure while
    /// processing one replica is recorded as that replica's outcome only;
    /// remaining replicas still run.
    pub fn sync_all(&self, options: SyncOptions) -> BTreeMap<String, ReplicaOutcome> {
        let source = build_catalog(&self.library_path);
        let mut results = BTreeMap::new();

        for replica in &self.replica_paths {
            let key = replica.to_string_lossy().to_string();
            match self.sync_replica(&source, replica, options) {
                Ok(stats) => {
                    results.insert(key, ReplicaOutcome::Stats(stats));
                }
                Err(e) => {
                    error!("Failed to sync to {}: {}", replica.display(), e);
                    results.insert(
                        key,
                        ReplicaOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        results
    }

    /// Run one replica: catalog it, reconcile against the source snapshot,
    /// and apply the action list.
    fn sync_replica(
        &self,
        source: &Catalog,
        replica: &Path,
        options: SyncOptions,
    ) -> Result<RunStats> {
        info!(
            "Starting sync from {} to {}",
            self.library_path.display(),
            replica.display()
        );

        if !replica.exists() && !options.dry_run {
            fs::create_dir_all(replica).map_err(|e| Error::PathUnreachable {
                path: replica.to_path_buf(),
                source: e,
            })?;
            info!("Created destination directory: {}", replica.display());
        }

        let dest = build_catalog(replica);
        let actions = reconcile(source, &dest, &self.rules);
        let stats = Executor::new(source, replica, options.dry_run).apply_all(&actions);

        info!(
            "Sync completed for {}: {} added, {} updated, {} deleted, {} unchanged, {} ignored, {} errors",
            replica.display(),
            stats.added,
            stats.updated,
            stats.deleted,
            stats.unchanged,
            stats.ignored,
            stats.errors
        );
        Ok(stats)
    }

    /// Health probe: whether the library root is reachable and listable,
    /// plus the configured replica count.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            library_accessible: self.library_path.is_dir(),
            library_listable: fs::read_dir(&self.library_path).is_ok(),
            replica_count: self.replica_paths.len(),
        }
    }
}
