//! Relative path keys for file catalogs

use std::path::{Path, PathBuf};

/// A file's path relative to its tree root, normalized to forward slashes.
///
/// The relative path is the identity key of a catalog entry: the same file in
/// the source tree and in a replica tree yields the same `RelativePath`.
/// Paths are stored with forward slashes regardless of platform and convert
/// to native form only at I/O boundaries via [`RelativePath::resolve_under`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl RelativePath {
    /// Create a new RelativePath from any path-like input.
    ///
    /// Converts backslashes to forward slashes, drops empty and `.`
    /// components, and strips any leading separators.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let parts: Vec<&str> = raw
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        Self {
            inner: parts.join("/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the final path component.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// Get the extension of the final component, if present.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        let idx = name.rfind('.')?;
        if idx == 0 { None } else { Some(&name[idx + 1..]) }
    }

    /// Resolve to a platform-native path under `root` for I/O.
    pub fn resolve_under(&self, root: &Path) -> PathBuf {
        let mut resolved = root.to_path_buf();
        for part in self.inner.split('/') {
            if !part.is_empty() {
                resolved.push(part);
            }
        }
        resolved
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for RelativePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
