//! Action execution against a replica tree

use std::fs;
use std::path::Path;

use mirror_fs::{RelativePath, io};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::catalog::Catalog;

use super::reconcile::{Action, ActionKind};

/// Per-replica result of one run: counts and path lists for each action kind.
///
/// Every path list entry is the relative path, including error entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub ignored: usize,
    pub errors: usize,
    pub added_files: Vec<String>,
    pub updated_files: Vec<String>,
    pub deleted_files: Vec<String>,
    pub ignored_files: Vec<String>,
    pub error_files: Vec<String>,
}

impl RunStats {
    fn record_added(&mut self, path: &RelativePath) {
        self.added += 1;
        self.added_files.push(path.to_string());
    }

    fn record_updated(&mut self, path: &RelativePath) {
        self.updated += 1;
        self.updated_files.push(path.to_string());
    }

    fn record_deleted(&mut self, path: &RelativePath) {
        self.deleted += 1;
        self.deleted_files.push(path.to_string());
    }

    fn record_ignored(&mut self, path: &RelativePath) {
        self.ignored += 1;
        self.ignored_files.push(path.to_string());
    }

    fn record_error(&mut self, path: &RelativePath) {
        self.errors += 1;
        self.error_files.push(path.to_string());
    }
}

/// Applies (or simulates) a classified action list against one replica root.
///
/// Every mutating step is wrapped so a single file's failure degrades the
/// run instead of aborting it. In dry-run mode all actions are evaluated and
/// counted exactly as in a real run, but nothing on disk changes.
pub struct Executor<'a> {
    source: &'a Catalog,
    dest_root: &'a Path,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    pub fn new(source: &'a Catalog, dest_root: &'a Path, dry_run: bool) -> Self {
        Self {
            source,
            dest_root,
            dry_run,
        }
    }

    /// Apply the whole action list, producing the run statistics.
    pub fn apply_all(&self, actions: &[Action]) -> RunStats {
        let mut stats = RunStats::default();
        for action in actions {
            self.apply(action, &mut stats);
        }
        stats
    }

    fn apply(&self, action: &Action, stats: &mut RunStats) {
        match &action.kind {
            ActionKind::Add => self.copy_file(action, stats, false),
            ActionKind::Update => self.copy_file(action, stats, true),
            ActionKind::Delete => self.delete_file(action, stats),
            ActionKind::Unchanged => stats.unchanged += 1,
            ActionKind::Ignored => stats.record_ignored(&action.path),
            ActionKind::Error(message) => {
                warn!("{}", message);
                stats.record_error(&action.path);
            }
        }
    }

    fn copy_file(&self, action: &Action, stats: &mut RunStats, update: bool) {
        let Some(record) = self.source.get(&action.path) else {
            error!("Source record missing for {}", action.path);
            stats.record_error(&action.path);
            return;
        };

        if self.dry_run {
            if update {
                info!("Would update: {}", action.path);
                stats.record_updated(&action.path);
            } else {
                info!("Would add: {}", action.path);
                stats.record_added(&action.path);
            }
            return;
        }

        let dest_path = action.path.resolve_under(self.dest_root);
        match io::copy_with_mtime(&record.absolute_path, &dest_path) {
            Ok(_) if update => {
                info!("Updated: {}", action.path);
                stats.record_updated(&action.path);
            }
            Ok(_) => {
                info!("Added: {}", action.path);
                stats.record_added(&action.path);
            }
            Err(e) => {
                error!("Error copying {}: {}", action.path, e);
                stats.record_error(&action.path);
            }
        }
    }

    fn delete_file(&self, action: &Action, stats: &mut RunStats) {
        if self.dry_run {
            info!("Would delete: {}", action.path);
            stats.record_deleted(&action.path);
            return;
        }

        let dest_path = action.path.resolve_under(self.dest_root);
        match fs::remove_file(&dest_path) {
            Ok(()) => {
                info!("Deleted: {}", action.path);
                stats.record_deleted(&action.path);
            }
            Err(e) => {
                error!("Error deleting {}: {}", action.path, e);
                stats.record_error(&action.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_catalog;
    use std::fs;
    use tempfile::TempDir;

    fn action(rel: &str, kind: ActionKind) -> Action {
        Action {
            path: RelativePath::new(rel),
            kind,
        }
    }

    #[test]
    fn add_copies_file_into_replica() {
        let temp = TempDir::new().unwrap();
        let source_root = temp.path().join("library");
        let replica = temp.path().join("replica");
        fs::create_dir_all(source_root.join("book1")).unwrap();
        fs::write(source_root.join("book1/book1.epub"), b"payload").unwrap();

        let source = build_catalog(&source_root);
        let actions = vec![action("book1/book1.epub", ActionKind::Add)];
        let stats = Executor::new(&source, &replica, false).apply_all(&actions);

        assert_eq!(stats.added, 1);
        assert_eq!(stats.added_files, vec!["book1/book1.epub"]);
        assert_eq!(fs::read(replica.join("book1/book1.epub")).unwrap(), b"payload");
    }

    #[test]
    fn delete_removes_replica_file() {
        let temp = TempDir::new().unwrap();
        let replica = temp.path().join("replica");
        fs::create_dir_all(replica.join("book2")).unwrap();
        fs::write(replica.join("book2/book2.epub"), b"stale").unwrap();

        let source = Catalog::new();
        let actions = vec![action("book2/book2.epub", ActionKind::Delete)];
        let stats = Executor::new(&source, &replica, false).apply_all(&actions);

        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.deleted_files, vec!["book2/book2.epub"]);
        assert!(!replica.join("book2/book2.epub").exists());
    }

    #[test]
    fn dry_run_counts_without_mutating() {
        let temp = TempDir::new().unwrap();
        let source_root = temp.path().join("library");
        let replica = temp.path().join("replica");
        fs::create_dir_all(&source_root).unwrap();
        fs::create_dir_all(&replica).unwrap();
        fs::write(source_root.join("new.epub"), b"new").unwrap();
        fs::write(replica.join("stale.epub"), b"stale").unwrap();

        let source = build_catalog(&source_root);
        let actions = vec![
            action("new.epub", ActionKind::Add),
            action("stale.epub", ActionKind::Delete),
        ];
        let stats = Executor::new(&source, &replica, true).apply_all(&actions);

        assert_eq!(stats.added, 1);
        assert_eq!(stats.deleted, 1);
        assert!(!replica.join("new.epub").exists());
        assert!(replica.join("stale.epub").exists());
    }

    #[test]
    fn delete_failure_is_recorded_not_propagated() {
        let temp = TempDir::new().unwrap();
        let replica = temp.path().join("replica");
        fs::create_dir_all(&replica).unwrap();

        let source = Catalog::new();
        // File does not exist, so removal fails
        let actions = vec![
            action("ghost.epub", ActionKind::Delete),
            action("other.epub", ActionKind::Unchanged),
        ];
        let stats = Executor::new(&source, &replica, false).apply_all(&actions);

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.error_files, vec!["ghost.epub"]);
        // Remaining actions were still processed
        assert_eq!(stats.unchanged, 1);
    }

    #[test]
    fn error_action_from_reconciler_is_counted() {
        let temp = TempDir::new().unwrap();
        let source = Catalog::new();
        let actions = vec![action(
            "broken.epub",
            ActionKind::Error("Error hashing broken.epub: gone".to_string()),
        )];
        let stats = Executor::new(&source, temp.path(), false).apply_all(&actions);

        assert_eq!(stats.errors, 1);
        assert_eq!(stats.error_files, vec!["broken.epub"]);
    }
}
