//! Action classification between source and destination catalogs

use std::collections::BTreeSet;

use mirror_fs::{RelativePath, checksum};
use tracing::debug;

use crate::catalog::{Catalog, FileRecord};

/// Tolerance for modification-time drift, in seconds.
///
/// Filesystems round timestamps differently; a copy that carries the mtime
/// over can still land within a second of the original.
const MTIME_TOLERANCE_SECS: f64 = 1.0;

/// Replication rules: extensions excluded from replication, filenames exempt
/// from that exclusion, and destination filenames that must never be deleted.
#[derive(Debug, Clone)]
pub struct SyncRules {
    /// Lowercased extensions (without dot) excluded from replication
    ignored_extensions: BTreeSet<String>,
    /// Filenames replicated even when their extension is ignored
    ignore_exceptions: BTreeSet<String>,
    /// Destination filenames that survive regardless of source state
    protected_names: BTreeSet<String>,
    /// Modification-time tolerance in seconds
    pub mtime_tolerance: f64,
}

impl SyncRules {
    /// Rules for a Calibre-style content library.
    ///
    /// Database and JSON sidecar files stay out of replicas, except the
    /// metadata database itself; the metadata database and its preferences
    /// backup are never deleted from a replica.
    pub fn library_defaults() -> Self {
        Self {
            ignored_extensions: ["db", "json"].iter().map(ToString::to_string).collect(),
            ignore_exceptions: ["metadata.db"].iter().map(ToString::to_string).collect(),
            protected_names: ["metadata.db", "metadata_db_prefs_backup.json"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            mtime_tolerance: MTIME_TOLERANCE_SECS,
        }
    }

    /// Whether replication skips this path entirely.
    pub fn is_ignored(&self, path: &RelativePath) -> bool {
        if self.ignore_exceptions.contains(path.file_name()) {
            return false;
        }
        match path.extension() {
            Some(ext) => self.ignored_extensions.contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }

    /// Whether a destination file must survive regardless of source state.
    pub fn is_protected(&self, path: &RelativePath) -> bool {
        self.protected_names.contains(path.file_name())
    }
}

impl Default for SyncRules {
    fn default() -> Self {
        Self::library_defaults()
    }
}

/// Classified outcome for one relative path.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub path: RelativePath,
    pub kind: ActionKind,
}

/// What the executor should do for one path.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// Copy a file absent from the destination
    Add,
    /// Overwrite a destination file whose content differs
    Update,
    /// Remove a destination file absent from the source
    Delete,
    /// Leave the file alone
    Unchanged,
    /// Excluded by the ignore rules
    Ignored,
    /// Classification itself failed; carries the message
    Error(String),
}

/// Classify every known path into an action by comparing two catalogs.
///
/// Metadata comparison is the fast path. Hashing is the expensive,
/// authoritative fallback used only when size or modification time disagree,
/// bounding the amortized cost to roughly one pass over the changed subset.
/// Metadata equality is taken as sufficient proof of equality, trusting the
/// filesystem's size and timestamps. Matching hashes despite a metadata
/// mismatch yield `Unchanged`: metadata drift without content drift is
/// accepted, not corrected.
///
/// Output order: source-driven actions in catalog order, then deletions in
/// catalog order.
pub fn reconcile(source: &Catalog, dest: &Catalog, rules: &SyncRules) -> Vec<Action> {
    let mut actions = Vec::with_capacity(source.len() + dest.len());
    let mut replicated: BTreeSet<&RelativePath> = BTreeSet::new();

    for (path, source_record) in source {
        if rules.is_ignored(path) {
            debug!("Ignoring database/config file: {}", path);
            actions.push(Action {
                path: path.clone(),
                kind: ActionKind::Ignored,
            });
            continue;
        }

        replicated.insert(path);

        let Some(dest_record) = dest.get(path) else {
            actions.push(Action {
                path: path.clone(),
                kind: ActionKind::Add,
            });
            continue;
        };

        let mtime_delta = (source_record.modified_secs() - dest_record.modified_secs()).abs();
        let kind = if source_record.size != dest_record.size || mtime_delta > rules.mtime_tolerance
        {
            compare_contents(source_record, dest_record)
        } else {
            ActionKind::Unchanged
        };
        actions.push(Action {
            path: path.clone(),
            kind,
        });
    }

    // Destination files not replicated from the source are deleted, except
    // protected system files which are skipped without being reported.
    for path in dest.keys() {
        if replicated.contains(path) {
            continue;
        }
        if rules.is_protected(path) {
            debug!("Preserving system file: {}", path);
            continue;
        }
        actions.push(Action {
            path: path.clone(),
            kind: ActionKind::Delete,
        });
    }

    actions
}

/// Metadata was inconclusive; the content hash decides.
fn compare_contents(source: &FileRecord, dest: &FileRecord) -> ActionKind {
    let source_hash = match checksum::compute_file_checksum(&source.absolute_path) {
        Ok(hash) => hash,
        Err(e) => {
            return ActionKind::Error(format!("Error hashing {}: {}", source.relative_path, e));
        }
    };
    let dest_hash = match checksum::compute_file_checksum(&dest.absolute_path) {
        Ok(hash) => hash,
        Err(e) => {
            return ActionKind::Error(format!("Error hashing {}: {}", dest.relative_path, e));
        }
    };

    if source_hash != dest_hash {
        ActionKind::Update
    } else {
        ActionKind::Unchanged
    }
}
