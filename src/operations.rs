//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the purge engine can be
//! unit-tested without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MockFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

use crate::resources::helpers::fs;

/// Abstraction over the filesystem queries and mutations used by the purge
/// engine.
///
/// None of the queries follow links: a link is reported as existing even when
/// dangling, and a directory link is never reported as a directory.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if an entry exists at `path` (links are not followed).
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a real directory, not a link to one.
    fn is_dir(&self, path: &Path) -> bool;

    /// Expand a glob pattern.  An invalid pattern or unreadable entries yield
    /// no matches rather than an error.
    fn glob(&self, pattern: &str) -> Vec<PathBuf>;

    /// Returns the immediate child paths inside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Forcefully remove `path`: files and links directly, directories with
    /// their whole contents.  Read-only entries are cleared and retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry (or something inside it) cannot be removed.
    fn remove_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        fs::entry_exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.symlink_metadata()
            .is_ok_and(|meta| meta.is_dir() && !fs::is_link(&meta))
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let options = glob::MatchOptions {
            case_sensitive: !cfg!(windows),
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        glob::glob_with(pattern, options)
            .map(|paths| paths.filter_map(Result::ok).collect())
            .unwrap_or_default()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()))
            .collect()
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_entry(path)
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// Holds an in-memory tree of files and directories.  Directory listings are
/// derived from the registered paths; glob results are configured per
/// pattern.  Every `remove_all` call is recorded so tests can assert on
/// deletion order.
///
/// # Example
///
/// ```ignore
/// use provision_cli::operations::MockFileSystemOps;
///
/// let fs = MockFileSystemOps::new()
///     .with_dir("/tmp")
///     .with_file("/tmp/a.txt")
///     .with_glob("/tmp/*", ["/tmp/a.txt"]);
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    entries: std::sync::Mutex<std::collections::BTreeMap<PathBuf, bool>>,
    globs: std::collections::HashMap<String, Vec<PathBuf>>,
    locked: Vec<PathBuf>,
    aliases: Vec<(PathBuf, PathBuf)>,
    removals: std::sync::Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(self, path: impl Into<PathBuf>, is_dir: bool) -> Self {
        self.entries
            .lock()
            .expect("mock entries poisoned")
            .insert(path.into(), is_dir);
        self
    }

    /// Register a regular file.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>) -> Self {
        self.insert(path, false)
    }

    /// Register a directory.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.insert(path, true)
    }

    /// Set the matches returned by [`FileSystemOps::glob`] for `pattern`.
    #[must_use]
    pub fn with_glob<I, P>(mut self, pattern: &str, matches: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.globs
            .insert(pattern.to_string(), matches.into_iter().map(Into::into).collect());
        self
    }

    /// Make removal of `path` fail with `PermissionDenied` (a file in use).
    #[must_use]
    pub fn with_locked(mut self, path: impl Into<PathBuf>) -> Self {
        self.locked.push(path.into());
        self
    }

    /// Make `a` and `b` two names for the same entry: removing one removes
    /// both (like an 8.3 short name and its long name).
    #[must_use]
    pub fn with_alias(mut self, a: impl Into<PathBuf>, b: impl Into<PathBuf>) -> Self {
        self.aliases.push((a.into(), b.into()));
        self
    }

    /// Paths passed to `remove_all`, in call order.
    #[must_use]
    pub fn removals(&self) -> Vec<PathBuf> {
        self.removals.lock().expect("mock removals poisoned").clone()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .expect("mock entries poisoned")
            .contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .expect("mock entries poisoned")
            .get(path)
            .copied()
            .unwrap_or(false)
    }

    fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        self.globs
            .get(pattern)
            .map(|matches| {
                matches
                    .iter()
                    .filter(|p| self.exists(p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Ok(self
            .entries
            .lock()
            .expect("mock entries poisoned")
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        self.removals
            .lock()
            .expect("mock removals poisoned")
            .push(path.to_path_buf());
        let mut entries = self.entries.lock().expect("mock entries poisoned");
        if !entries.contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        if self.locked.iter().any(|l| l.starts_with(path)) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "The process cannot access the file because it is being used by another process.",
            ));
        }
        let alias = self.aliases.iter().find_map(|(a, b)| {
            if a == path {
                Some(b)
            } else if b == path {
                Some(a)
            } else {
                None
            }
        });
        entries.retain(|p, _| !p.starts_with(path) && alias.is_none_or(|a| !p.starts_with(a)));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn system_glob_matches_children() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.tmp"), "").unwrap();
        std::fs::write(dir.path().join("b.log"), "").unwrap();
        let pattern = format!("{}/*.tmp", dir.path().display());

        let matches = SystemFileSystemOps.glob(&pattern);

        assert_eq!(matches, vec![dir.path().join("a.tmp")]);
    }

    #[test]
    fn system_glob_invalid_pattern_is_empty() {
        assert!(SystemFileSystemOps.glob("[unclosed").is_empty());
    }

    #[test]
    fn system_is_dir_does_not_follow_links() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        fs::create_link(&real, &link).unwrap();

        assert!(SystemFileSystemOps.is_dir(&real));
        assert!(!SystemFileSystemOps.is_dir(&link));
        assert!(SystemFileSystemOps.exists(&link));
    }

    #[test]
    fn system_read_dir_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SystemFileSystemOps.read_dir(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn mock_remove_all_drops_descendants() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_dir("/t/sub")
            .with_file("/t/sub/a");

        fs.remove_all(Path::new("/t/sub")).unwrap();

        assert!(fs.exists(Path::new("/t")));
        assert!(!fs.exists(Path::new("/t/sub/a")));
        assert_eq!(fs.read_dir(Path::new("/t")).unwrap(), Vec::<PathBuf>::new());
    }

    #[test]
    fn mock_locked_entry_fails_removal_of_ancestors() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_file("/t/in-use")
            .with_locked("/t/in-use");

        let err = fs.remove_all(Path::new("/t")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.exists(Path::new("/t/in-use")));
    }
}
