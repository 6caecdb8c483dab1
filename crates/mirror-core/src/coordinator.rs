//! Run coordination: single-flight trigger and process-wide run state
//!
//! The coordinator owns the only mutable run state in the process, behind a
//! mutex. A triggered run executes on a dedicated background thread whose
//! completion callback updates the state and appends one history entry.
//! Cancellation is not supported: once started, a run proceeds to
//! completion.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::history::{HistoryStore, SyncHistoryEntry, SyncStatus, SyncType};
use crate::sync::{ReplicaOutcome, SyncEngine, SyncOptions};

/// Process-wide run state. Single instance, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    /// Whether an orchestration run is currently active
    pub in_progress: bool,
    /// Completion time of the last successful run
    pub last_sync: Option<DateTime<Utc>>,
    /// Per-replica results of the last successful run
    pub last_result: Option<BTreeMap<String, ReplicaOutcome>>,
    /// Message of the last failed run
    pub last_error: Option<String>,
}

/// Immediate acknowledgment of a trigger call.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// A run was started in the background
    Started { last_sync: Option<DateTime<Utc>> },
    /// A run is already active; the caller must retry later
    AlreadyRunning { last_sync: Option<DateTime<Utc>> },
}

/// Ensures at most one orchestration run is active at a time process-wide.
///
/// Cloning is cheap; all clones share the same state, engine, and history
/// store.
#[derive(Clone)]
pub struct RunCoordinator {
    engine: Arc<SyncEngine>,
    history: Arc<HistoryStore>,
    state: Arc<Mutex<RunState>>,
}

impl RunCoordinator {
    /// Create a coordinator in the idle state.
    ///
    /// The last completion timestamp is seeded from the persisted history so
    /// trigger acknowledgments stay meaningful across process restarts.
    pub fn new(engine: SyncEngine, history: HistoryStore) -> Self {
        let last_sync = history.latest().map(|entry| entry.timestamp);
        Self {
            engine: Arc::new(engine),
            history: Arc::new(history),
            state: Arc::new(Mutex::new(RunState {
                last_sync,
                ..RunState::default()
            })),
        }
    }

    /// The history store shared with this coordinator.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The engine shared with this coordinator.
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Start a background run unless one is already active.
    ///
    /// Returns immediately in both cases. The run outcome is only visible
    /// via [`RunCoordinator::status`] and the history queries, never via the
    /// trigger acknowledgment itself.
    pub fn trigger(&self, dry_run: bool) -> TriggerOutcome {
        let last_sync = match self.begin() {
            Ok(last_sync) => last_sync,
            Err(last_sync) => return TriggerOutcome::AlreadyRunning { last_sync },
        };

        let coordinator = self.clone();
        let spawned = thread::Builder::new()
            .name("mirror-sync".to_string())
            .spawn(move || {
                coordinator.execute(dry_run);
            });

        if let Err(e) = spawned {
            error!("Failed to spawn sync thread: {}", e);
            let entry = self.make_entry(
                dry_run,
                0.0,
                BTreeMap::new(),
                Some(format!("failed to spawn sync thread: {e}")),
            );
            self.record(&entry);
        }

        TriggerOutcome::Started { last_sync }
    }

    /// Run synchronously on the calling thread unless a run is already
    /// active, returning the recorded history entry.
    pub fn run_blocking(&self, dry_run: bool) -> Option<SyncHistoryEntry> {
        if self.begin().is_err() {
            return None;
        }
        Some(self.execute(dry_run))
    }

    /// Snapshot of the current run state.
    pub fn status(&self) -> RunState {
        self.lock_state().clone()
    }

    /// Flip to busy. `Err` carries the last completion timestamp when a run
    /// is already active.
    fn begin(&self) -> std::result::Result<Option<DateTime<Utc>>, Option<DateTime<Utc>>> {
        let mut state = self.lock_state();
        if state.in_progress {
            return Err(state.last_sync);
        }
        state.in_progress = true;
        state.last_result = None;
        state.last_error = None;
        Ok(state.last_sync)
    }

    /// Perform the run and record its outcome. Assumes the busy flag is set.
    fn execute(&self, dry_run: bool) -> SyncHistoryEntry {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.engine.sync_all(SyncOptions { dry_run })
        }));
        let duration = started.elapsed().as_secs_f64();

        let (results, error) = match outcome {
            Ok(results) => (results, None),
            Err(payload) => {
                let message = panic_message(payload);
                error!("Error during sync: {}", message);
                (BTreeMap::new(), Some(message))
            }
        };

        let entry = self.make_entry(dry_run, duration, results, error);
        self.record(&entry);
        entry
    }

    fn make_entry(
        &self,
        dry_run: bool,
        duration: f64,
        results: BTreeMap<String, ReplicaOutcome>,
        error: Option<String>,
    ) -> SyncHistoryEntry {
        SyncHistoryEntry {
            timestamp: Utc::now(),
            sync_type: if dry_run { SyncType::DryRun } else { SyncType::Sync },
            status: if error.is_none() {
                SyncStatus::Completed
            } else {
                SyncStatus::Failed
            },
            duration,
            library_path: self.engine.library_path().to_string_lossy().to_string(),
            replica_paths: self
                .engine
                .replica_paths()
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            results,
            error,
        }
    }

    /// Completion callback: update state, then append to history.
    fn record(&self, entry: &SyncHistoryEntry) {
        {
            let mut state = self.lock_state();
            state.in_progress = false;
            if entry.status == SyncStatus::Completed {
                state.last_sync = Some(entry.timestamp);
                state.last_result = Some(entry.results.clone());
                state.last_error = None;
            } else {
                state.last_result = None;
                state.last_error = entry.error.clone();
            }
        }

        // History is best-effort; the in-memory result stays authoritative
        if let Err(e) = self.history.append(entry.clone()) {
            warn!("Failed to record sync history: {}", e);
        }

        info!(
            "Sync run recorded: {:?} ({:.2}s)",
            entry.status, entry.duration
        );
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        // A panicking run thread must not leave the state unreadable
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "sync run panicked".to_string()
    }
}
