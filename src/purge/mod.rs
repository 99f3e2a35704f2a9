//! Glob purge engine: delete everything a directory-glob pattern matches.
//!
//! A purge never fails as a whole.  Missing directories, entries that vanish
//! mid-run and locked files all end up as counters in a [`PurgeSummary`].
pub mod enumerate;

use std::io;

use serde::Serialize;
use tracing::debug;

pub use enumerate::PurgeItem;

use crate::expand::Environment;
use crate::operations::FileSystemOps;

/// A single purge pattern, possibly containing environment references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    /// Directory-glob pattern such as `%WINDIR%\Prefetch\*`.
    pub pattern: String,
}

impl PurgeRequest {
    /// Create a new request.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// Policy knobs for [`purge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOptions {
    /// Enumerate only; delete nothing.
    pub dry_run: bool,
}

/// A deletion that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Entry that could not be removed.
    pub path: std::path::PathBuf,
    /// The operating system's error message.
    pub error: String,
}

/// Aggregate result of one purge request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    /// The expanded, normalised pattern that was enumerated.
    pub pattern: String,
    /// Number of entries enumerated.
    pub requested: usize,
    /// Entries deleted by this run.
    pub deleted: usize,
    /// Entries that could not be deleted.
    pub failed: usize,
    /// Entries that had already disappeared when their turn came.
    pub already_gone: usize,
    /// Detail for every failed entry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

impl PurgeSummary {
    /// Entries no longer present: deleted plus already gone.
    #[must_use]
    pub const fn removed_total(&self) -> usize {
        self.deleted + self.already_gone
    }

    /// One-line summary (e.g. "12 deleted, 1 failed, 3 already gone").
    #[must_use]
    pub fn describe(&self, dry_run: bool) -> String {
        if dry_run {
            return format!("{} would be deleted", self.requested);
        }
        format!(
            "{} deleted, {} failed, {} already gone",
            self.deleted, self.failed, self.already_gone
        )
    }
}

/// Expand and normalise the request's pattern.
#[must_use]
pub fn resolve_pattern(request: &PurgeRequest, env: &Environment, fs: &dyn FileSystemOps) -> String {
    enumerate::normalize(&env.expand(&request.pattern), fs)
}

/// Enumerate what [`purge`] would delete, in deletion order.
#[must_use]
pub fn plan(request: &PurgeRequest, env: &Environment, fs: &dyn FileSystemOps) -> Vec<PurgeItem> {
    enumerate::enumerate(&resolve_pattern(request, env, fs), fs)
}

/// Delete every entry the request matches, deepest first.
#[must_use]
pub fn purge(
    request: &PurgeRequest,
    options: PurgeOptions,
    env: &Environment,
    fs: &dyn FileSystemOps,
) -> PurgeSummary {
    let pattern = resolve_pattern(request, env, fs);
    let items = enumerate::enumerate(&pattern, fs);
    let mut summary = PurgeSummary {
        pattern,
        requested: items.len(),
        ..PurgeSummary::default()
    };
    if options.dry_run {
        return summary;
    }

    for item in items {
        let path = item.absolute_path;
        if !fs.exists(&path) {
            summary.already_gone += 1;
            continue;
        }
        match fs.remove_all(&path) {
            Ok(()) => summary.deleted += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => summary.already_gone += 1,
            Err(e) => {
                debug!("cannot delete {}: {e}", path.display());
                summary.failed += 1;
                summary.failures.push(ItemFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }
    summary
}

/// Run [`purge`] for each request in order.
#[must_use]
pub fn purge_all(
    requests: &[PurgeRequest],
    options: PurgeOptions,
    env: &Environment,
    fs: &dyn FileSystemOps,
) -> Vec<PurgeSummary> {
    requests
        .iter()
        .map(|request| purge(request, options, env, fs))
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::operations::{MockFileSystemOps, SystemFileSystemOps};
    use std::path::{Path, PathBuf};

    fn counts(s: &PurgeSummary) -> (usize, usize, usize) {
        (s.deleted, s.failed, s.already_gone)
    }

    #[test]
    fn zero_matches_is_all_zero() {
        let fs = MockFileSystemOps::new();
        let summary = purge(
            &PurgeRequest::new("/does/not/exist/*"),
            PurgeOptions::default(),
            &Environment::default(),
            &fs,
        );
        assert_eq!(summary.requested, 0);
        assert_eq!(counts(&summary), (0, 0, 0));
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn deletes_both_files_then_nothing_left() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t1.txt"), "1").unwrap();
        std::fs::write(dir.path().join("t2.txt"), "2").unwrap();
        let request = PurgeRequest::new(format!("{}/*", dir.path().display()));
        let env = Environment::default();

        let first = purge(&request, PurgeOptions::default(), &env, &SystemFileSystemOps);
        let second = purge(&request, PurgeOptions::default(), &env, &SystemFileSystemOps);

        assert_eq!(counts(&first), (2, 0, 0));
        assert_eq!(counts(&second), (0, 0, 0));
        assert!(dir.path().exists());
    }

    #[test]
    fn bare_directory_keeps_directory_itself() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(cache.join("nested")).unwrap();
        std::fs::write(cache.join("nested").join("blob"), "x").unwrap();
        std::fs::write(cache.join("top.tmp"), "x").unwrap();

        let summary = purge(
            &PurgeRequest::new(cache.to_string_lossy()),
            PurgeOptions::default(),
            &Environment::default(),
            &SystemFileSystemOps,
        );

        assert_eq!(summary.requested, 3);
        assert_eq!(summary.removed_total(), 3);
        assert!(cache.is_dir());
        assert_eq!(std::fs::read_dir(&cache).unwrap().count(), 0);
    }

    #[test]
    fn deletes_deepest_first() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_dir("/t/d")
            .with_dir("/t/d/e")
            .with_file("/t/d/e/f.txt")
            .with_file("/t/z")
            .with_glob("/t/*", ["/t/d", "/t/z"]);

        let summary = purge(
            &PurgeRequest::new("/t/*"),
            PurgeOptions::default(),
            &Environment::default(),
            &fs,
        );

        assert_eq!(counts(&summary), (4, 0, 0));
        assert_eq!(
            fs.removals(),
            vec![
                PathBuf::from("/t/d/e/f.txt"),
                PathBuf::from("/t/d/e"),
                PathBuf::from("/t/z"),
                PathBuf::from("/t/d"),
            ]
        );
        assert!(fs.exists(Path::new("/t")));
    }

    #[test]
    fn entry_removed_through_alias_counts_as_already_gone() {
        // An 8.3 short name and its long name address the same directory.
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_dir("/t/long-directory-name")
            .with_dir("/t/LONGDI~1")
            .with_alias("/t/long-directory-name", "/t/LONGDI~1")
            .with_glob("/t/*", ["/t/long-directory-name", "/t/LONGDI~1"]);

        let summary = purge(
            &PurgeRequest::new("/t/*"),
            PurgeOptions::default(),
            &Environment::default(),
            &fs,
        );

        assert_eq!(summary.requested, 2);
        assert_eq!(counts(&summary), (1, 0, 1));
        assert_eq!(summary.removed_total(), 2);
        assert_eq!(fs.removals(), vec![PathBuf::from("/t/long-directory-name")]);
    }

    #[test]
    fn overlapping_requests_report_already_gone_not_failure() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_dir("/t/cache")
            .with_file("/t/cache/a")
            .with_glob("/t/*", ["/t/cache"])
            .with_glob("/t/cache/*", ["/t/cache/a"]);
        let requests = [PurgeRequest::new("/t/*"), PurgeRequest::new("/t/cache/*")];

        let summaries = purge_all(&requests, PurgeOptions::default(), &Environment::default(), &fs);

        assert_eq!(counts(&summaries[0]), (2, 0, 0));
        assert_eq!(summaries[1].requested, 0);
        assert_eq!(counts(&summaries[1]), (0, 0, 0));
    }

    #[test]
    fn locked_file_fails_without_aborting() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_file("/t/in-use.log")
            .with_file("/t/stale.tmp")
            .with_locked("/t/in-use.log")
            .with_glob("/t/*", ["/t/in-use.log", "/t/stale.tmp"]);

        let summary = purge(
            &PurgeRequest::new("/t/*"),
            PurgeOptions::default(),
            &Environment::default(),
            &fs,
        );

        assert_eq!(counts(&summary), (1, 1, 0));
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, PathBuf::from("/t/in-use.log"));
        assert!(summary.failures[0].error.contains("being used"));
        assert!(!fs.exists(Path::new("/t/stale.tmp")));
    }

    #[test]
    fn dry_run_only_counts() {
        let fs = MockFileSystemOps::new()
            .with_dir("/t")
            .with_file("/t/a")
            .with_glob("/t/*", ["/t/a"]);

        let summary = purge(
            &PurgeRequest::new("/t/*"),
            PurgeOptions { dry_run: true },
            &Environment::default(),
            &fs,
        );

        assert_eq!(summary.requested, 1);
        assert_eq!(counts(&summary), (0, 0, 0));
        assert!(fs.removals().is_empty());
        insta::assert_snapshot!(summary.describe(true), @"1 would be deleted");
    }

    #[test]
    fn expands_environment_in_pattern() {
        let fs = MockFileSystemOps::new()
            .with_dir("/win/Prefetch")
            .with_file("/win/Prefetch/APP.pf")
            .with_glob("/win/Prefetch/*", ["/win/Prefetch/APP.pf"]);
        let env = Environment::from_pairs([("WINDIR", "/win")]);

        let summary = purge(
            &PurgeRequest::new("%WINDIR%/Prefetch/*"),
            PurgeOptions::default(),
            &env,
            &fs,
        );

        assert_eq!(summary.pattern, "/win/Prefetch/*");
        assert_eq!(counts(&summary), (1, 0, 0));
        insta::assert_snapshot!(summary.describe(false), @"1 deleted, 0 failed, 0 already gone");
    }

    #[cfg(unix)]
    #[test]
    fn read_only_entries_are_removed() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ro.tmp");
        std::fs::write(&file, "x").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o444)).unwrap();

        let summary = purge(
            &PurgeRequest::new(format!("{}/*", dir.path().display())),
            PurgeOptions::default(),
            &Environment::default(),
            &SystemFileSystemOps,
        );

        assert_eq!(counts(&summary), (1, 0, 0));
        assert!(!file.exists());
    }
}
