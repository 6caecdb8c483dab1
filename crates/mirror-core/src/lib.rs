//! Core reconciliation engine for Library Mirror
//!
//! This crate implements the replication pipeline and its bookkeeping:
//!
//! - **Catalog builder**: walks a directory tree into a relative-path-keyed
//!   metadata snapshot
//! - **Reconciler**: classifies every known path into an action by comparing
//!   two catalogs
//! - **Executor**: applies (or simulates) the classified actions against a
//!   replica tree
//! - **SyncEngine**: fans one run out across all configured replicas with
//!   per-replica failure isolation
//! - **HistoryStore**: bounded, durable log of completed runs
//! - **RunCoordinator**: single-flight trigger and process-wide run state
//!
//! # Architecture
//!
//! `mirror-core` sits above the filesystem layer and below the CLI/API layer:
//!
//! ```text
//!              CLI / API
//!                  |
//!           RunCoordinator
//!             /        \
//!       SyncEngine   HistoryStore
//!       /    |    \        |
//! catalog reconcile executor
//!                  |
//!              mirror-fs
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod sync;

pub use catalog::{Catalog, FileRecord, build_catalog};
pub use config::{Settings, parse_replica_list};
pub use coordinator::{RunCoordinator, RunState, TriggerOutcome};
pub use error::{Error, Result};
pub use history::{HistoryStats, HistoryStore, SyncHistoryEntry, SyncStatus, SyncType};
pub use sync::{
    Action, ActionKind, Executor, HealthReport, ReplicaOutcome, RunStats, SyncEngine, SyncOptions,
    SyncRules, reconcile,
};
