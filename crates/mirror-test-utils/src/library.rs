//! [`LibraryFixture`] builder for library-mirror test scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding a content library and any number of replica
/// trees, with helper methods for test setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::LibraryFixture;
///
/// let fixture = LibraryFixture::new();
/// fixture.standard_library();
/// let replica = fixture.replica("replica1");
/// fixture.assert_file_exists("library/book1/book1.epub");
/// ```
pub struct LibraryFixture {
    temp_dir: TempDir,
}

impl Default for LibraryFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryFixture {
    /// Create a temporary directory with an empty `library/` subdirectory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("library")).unwrap();
        Self { temp_dir }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Return the library root.
    pub fn library(&self) -> PathBuf {
        self.root().join("library")
    }

    /// Return a replica root by name. The directory is not created; a first
    /// sync run is expected to do that.
    pub fn replica(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write a file relative to the fixture root, creating parent
    /// directories. Returns the absolute path.
    pub fn write_file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write a file relative to the library root, creating parent
    /// directories. Returns the absolute path.
    pub fn write_library_file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        self.write_file(&format!("library/{rel}"), contents)
    }

    /// Pin the modification time of a file (relative to the fixture root) to
    /// a Unix timestamp.
    pub fn set_mtime(&self, rel: &str, unix_seconds: i64) {
        let path = self.root().join(rel);
        filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(unix_seconds, 0))
            .unwrap();
    }

    /// Populate the standard sample library: one book directory with a
    /// 10 000-byte payload and a 500-byte metadata sidecar.
    pub fn standard_library(&self) {
        self.write_library_file("book1/book1.epub", &vec![0x42; 10_000]);
        self.write_library_file("book1/metadata.opf", &vec![0x6d; 500]);
    }

    /// Assert that `path` (relative to the fixture root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the fixture root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Byte-for-byte snapshot of every file under `rel`, keyed by path
    /// relative to that subtree. An absent subtree snapshots as empty.
    pub fn snapshot(&self, rel: &str) -> BTreeMap<String, Vec<u8>> {
        let root = self.root().join(rel);
        let mut files = BTreeMap::new();
        if !root.exists() {
            return files;
        }
        for entry in walkdir::WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.unwrap();
            if !entry.file_type().is_file() {
                continue;
            }
            let key = entry
                .path()
                .strip_prefix(&root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            files.insert(key, fs::read(entry.path()).unwrap());
        }
        files
    }
}
