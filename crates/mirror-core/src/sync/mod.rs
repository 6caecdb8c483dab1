//! Reconciliation engine for library replication
//!
//! This module provides:
//! - **reconcile**: Classify every known path by comparing two catalogs
//! - **executor**: Apply or simulate the classified actions against a replica
//! - **engine**: Fan one run out across all configured replicas

mod engine;
mod executor;
mod reconcile;

pub use engine::{HealthReport, ReplicaOutcome, SyncEngine, SyncOptions};
pub use executor::{Executor, RunStats};
pub use reconcile::{Action, ActionKind, SyncRules, reconcile};
