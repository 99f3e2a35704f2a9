//! Pattern normalisation and two-pass enumeration of purge candidates.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::operations::FileSystemOps;

/// One entry scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeItem {
    /// Path of the entry (absolute whenever the pattern is).
    pub absolute_path: PathBuf,
    /// Whether the entry was a real directory when enumerated.
    pub is_directory: bool,
    /// Length of the path string in characters; only used for ordering.
    pub path_length: usize,
}

impl PurgeItem {
    fn new(path: PathBuf, is_directory: bool) -> Self {
        let path_length = path.to_string_lossy().chars().count();
        Self {
            absolute_path: path,
            is_directory,
            path_length,
        }
    }
}

/// Whether `pattern` contains glob metacharacters.
#[must_use]
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Turn a bare existing directory into a "everything inside" glob.
///
/// The directory itself survives: only its contents match `<dir>/*`.
/// Anything else is returned unchanged.
#[must_use]
pub fn normalize(pattern: &str, fs: &dyn FileSystemOps) -> String {
    if is_glob(pattern) {
        return pattern.to_string();
    }
    let trimmed = pattern.trim_end_matches(['/', '\\']);
    let dir = if trimmed.is_empty() { pattern } else { trimmed };
    if fs.is_dir(Path::new(dir)) {
        Path::new(dir).join("*").to_string_lossy().into_owned()
    } else {
        pattern.to_string()
    }
}

/// Enumerate everything a normalised pattern addresses.
///
/// Two passes, merged and deduplicated by path:
///
/// 1. glob expansion, with every matched directory walked recursively
///    (links are listed but never descended into);
/// 2. a literal probe of the pattern as a path, which catches entries the
///    glob pass does not surface.
///
/// Missing or unreadable entries contribute nothing.  The result is in
/// deletion order: longest path first, ties in reverse lexical order.
#[must_use]
pub fn enumerate(pattern: &str, fs: &dyn FileSystemOps) -> Vec<PurgeItem> {
    let mut found: BTreeMap<PathBuf, bool> = BTreeMap::new();

    for path in fs.glob(pattern) {
        walk(path, fs, &mut found);
    }

    let literal = PathBuf::from(pattern);
    if fs.exists(&literal) {
        walk(literal, fs, &mut found);
    }

    let mut items: Vec<PurgeItem> = found
        .into_iter()
        .map(|(path, is_dir)| PurgeItem::new(path, is_dir))
        .collect();
    sort_deepest_first(&mut items);
    items
}

fn walk(path: PathBuf, fs: &dyn FileSystemOps, found: &mut BTreeMap<PathBuf, bool>) {
    let mut stack = vec![path];
    while let Some(path) = stack.pop() {
        if found.contains_key(&path) {
            continue;
        }
        let is_dir = fs.is_dir(&path);
        if is_dir && let Ok(children) = fs.read_dir(&path) {
            stack.extend(children);
        }
        found.insert(path, is_dir);
    }
}

/// Sort by path length descending, ties broken by reverse lexical order.
pub fn sort_deepest_first(items: &mut [PurgeItem]) {
    items.sort_by(|a, b| {
        b.path_length
            .cmp(&a.path_length)
            .then_with(|| b.absolute_path.cmp(&a.absolute_path))
    });
}
