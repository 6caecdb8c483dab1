//! Command implementations

mod history;
mod sync;

pub use history::{run_history_clear, run_history_latest, run_history_list, run_history_stats};
pub use sync::{run_health, run_status, run_sync};

use mirror_core::{HistoryStore, RunCoordinator, Settings, SyncEngine};

/// Wire the engine, history store, and coordinator from settings.
pub(crate) fn build_coordinator(settings: &Settings) -> RunCoordinator {
    RunCoordinator::new(SyncEngine::new(settings), build_store(settings))
}

pub(crate) fn build_store(settings: &Settings) -> HistoryStore {
    HistoryStore::new(&settings.history_path).with_max_entries(settings.max_history_entries)
}
