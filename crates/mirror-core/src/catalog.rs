//! Catalog construction by directory tree walking

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use mirror_fs::RelativePath;
use tracing::warn;
use walkdir::WalkDir;

/// Metadata snapshot of one real file.
///
/// Created fresh on every scan, never mutated, discarded after the run that
/// produced it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the tree root; the catalog identity key
    pub relative_path: RelativePath,
    /// Absolute filesystem location
    pub absolute_path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Modification time reported by the filesystem
    pub modified: SystemTime,
}

impl FileRecord {
    /// Modification time as fractional seconds since the Unix epoch.
    pub fn modified_secs(&self) -> f64 {
        self.modified
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Snapshot mapping of relative path to file metadata for one tree root.
///
/// The sorted map gives deterministic iteration order, so repeated scans of
/// an unchanged tree produce identical content in identical order.
pub type Catalog = BTreeMap<RelativePath, FileRecord>;

/// Walk the tree rooted at `root` and build its catalog.
///
/// Descends into every subdirectory with entries sorted by name. Files whose
/// name starts with a dot are skipped; directories are not filtered. A stat
/// failure on an individual file is logged and that file is skipped; it does
/// not abort the walk. A missing root yields an empty catalog: the
/// destination tree may not exist yet.
pub fn build_catalog(root: &Path) -> Catalog {
    let mut catalog = Catalog::new();

    if !root.exists() {
        return catalog;
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error walking {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(stripped) => RelativePath::new(stripped),
            Err(_) => continue,
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Error accessing {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Error accessing {}: {}", entry.path().display(), e);
                continue;
            }
        };

        catalog.insert(
            relative.clone(),
            FileRecord {
                relative_path: relative,
                absolute_path: entry.path().to_path_buf(),
                size: metadata.len(),
                modified,
            },
        );
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_yields_empty_catalog() {
        let catalog = build_catalog(Path::new("/nonexistent/library"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn catalogs_nested_files_with_relative_keys() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("book1")).unwrap();
        fs::write(temp.path().join("book1/book1.epub"), b"epub bytes").unwrap();
        fs::write(temp.path().join("book1/metadata.opf"), b"opf").unwrap();

        let catalog = build_catalog(temp.path());

        assert_eq!(catalog.len(), 2);
        let record = &catalog[&RelativePath::new("book1/book1.epub")];
        assert_eq!(record.size, 10);
        assert_eq!(record.absolute_path, temp.path().join("book1/book1.epub"));
    }

    #[test]
    fn skips_hidden_files_but_not_hidden_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".calnotes")).unwrap();
        fs::write(temp.path().join(".DS_Store"), b"junk").unwrap();
        fs::write(temp.path().join(".calnotes/note.txt"), b"note").unwrap();
        fs::write(temp.path().join("visible.epub"), b"book").unwrap();

        let catalog = build_catalog(temp.path());

        assert!(catalog.contains_key(&RelativePath::new("visible.epub")));
        assert!(catalog.contains_key(&RelativePath::new(".calnotes/note.txt")));
        assert!(!catalog.contains_key(&RelativePath::new(".DS_Store")));
    }

    #[test]
    fn repeated_scans_produce_identical_order() {
        let temp = TempDir::new().unwrap();
        for name in ["zeta.epub", "alpha.epub", "mid.epub"] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }

        let first: Vec<_> = build_catalog(temp.path()).into_keys().collect();
        let second: Vec<_> = build_catalog(temp.path()).into_keys().collect();

        assert_eq!(first, second);
        assert_eq!(first[0].as_str(), "alpha.epub");
    }

    #[test]
    fn directories_are_not_cataloged() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("empty_dir")).unwrap();

        let catalog = build_catalog(temp.path());
        assert!(catalog.is_empty());
    }
}
