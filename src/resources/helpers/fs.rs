//! File-system helpers shared by the link reconciler and the purge engine.
use anyhow::{Context as _, Result};
use std::io;
use std::path::{Path, PathBuf};

/// `FILE_ATTRIBUTE_DIRECTORY`
#[cfg(windows)]
const FILE_ATTRIBUTE_DIRECTORY: u32 = 0x10;
/// `FILE_ATTRIBUTE_REPARSE_POINT` (symlinks, junctions)
#[cfg(windows)]
const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
/// `ERROR_ACCESS_DENIED`
#[cfg(windows)]
const ERROR_ACCESS_DENIED: i32 = 5;
/// `ERROR_PRIVILEGE_NOT_HELD`
#[cfg(windows)]
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Whether `path` exists without following a final link.
///
/// Unlike [`Path::exists`], a dangling link counts as existing.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Check if metadata (from `symlink_metadata`) represents a link: a symlink
/// or, on Windows, any reparse point such as a junction.
#[must_use]
pub fn is_link(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.is_symlink() || meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0
    }
    #[cfg(not(windows))]
    {
        meta.is_symlink()
    }
}

/// Check if metadata represents a directory-like entry.
///
/// On Windows, `symlink_metadata().is_dir()` returns `false` for directory
/// symlinks, so the raw `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
#[must_use]
pub fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & FILE_ATTRIBUTE_DIRECTORY != 0
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Compare two paths, normalising the `\\?\` prefix that Windows
/// `read_link` prepends to extended-length paths.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    strip_verbatim(a) == strip_verbatim(b)
}

fn strip_verbatim(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    s.strip_prefix(r"\\?\")
        .map_or_else(|| p.to_path_buf(), PathBuf::from)
}

/// Whether the link at `link` resolves to `target`.
///
/// An absolute stored link text is compared first; failing that, both sides
/// are canonicalised so relative links and differing spellings of the same
/// location still match.  Relative link text is resolved against the link's
/// own directory, so it never matches on spelling alone.  Returns `false` if
/// `link` is not a link.
#[must_use]
pub fn link_points_to(link: &Path, target: &Path) -> bool {
    let Ok(stored) = std::fs::read_link(link) else {
        return false;
    };
    if stored.is_absolute() && paths_equal(&stored, target) {
        return true;
    }
    same_entry(link, target)
}

/// Whether `a` and `b` resolve to the same existing location.
#[must_use]
pub fn same_entry(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether removing the entry at `path` would also remove `target`.
///
/// Links are removed without following them, so only a real file or
/// directory that resolves to `target` or one of its ancestors qualifies.
/// This happens when `path` is reached through a directory that is itself
/// linked into the store.
#[must_use]
pub fn would_destroy(path: &Path, target: &Path) -> bool {
    let Ok(meta) = path.symlink_metadata() else {
        return false;
    };
    if is_link(&meta) {
        return false;
    }
    match (dunce::canonicalize(path), dunce::canonicalize(target)) {
        (Ok(path), Ok(target)) => target.starts_with(path),
        _ => false,
    }
}

/// The sibling path used to keep a replaced entry: `<name>.bak`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    path.file_name().map_or_else(
        || path.with_extension("bak"),
        |name| {
            let mut backup = name.to_os_string();
            backup.push(".bak");
            path.with_file_name(backup)
        },
    )
}

/// Move the entry at `path` to its [`backup_path`], replacing an older backup.
///
/// # Errors
///
/// Returns an error if the old backup cannot be removed or the rename fails.
pub fn move_to_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    if entry_exists(&backup) {
        remove_entry(&backup)
            .with_context(|| format!("remove old backup: {}", backup.display()))?;
    }
    std::fs::rename(path, &backup).with_context(|| {
        format!("back up {} to {}", path.display(), backup.display())
    })?;
    Ok(backup)
}

/// Forcefully remove whatever is at `path`.
///
/// Links (including junctions) are removed without touching what they point
/// to, files are unlinked, and real directories are removed recursively.  On
/// Windows a permission failure clears read-only attributes and retries once.
///
/// # Errors
///
/// Returns the underlying I/O error verbatim.
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if is_link(&meta) {
        return remove_link(path);
    }
    let remove = || {
        if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        }
    };
    match remove() {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied && clear_readonly(path) => remove(),
        other => other,
    }
}

/// Remove a link, handling platform differences.
///
/// On Windows, directory symlinks and junctions must be removed with
/// `remove_dir` (not `remove_file`).  If `remove_dir` fails with
/// "access denied", `cmd /c rmdir` is tried, which runs in a separate process
/// that holds no handles from this one.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn remove_link(path: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if is_dir_like(&meta) {
        match std::fs::remove_dir(path) {
            #[cfg(windows)]
            Err(e) if e.raw_os_error() == Some(ERROR_ACCESS_DENIED) => remove_dir_fallback(path),
            other => other,
        }
    } else {
        std::fs::remove_file(path)
    }
}

#[cfg(windows)]
fn remove_dir_fallback(path: &Path) -> io::Result<()> {
    use std::os::windows::process::CommandExt;
    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg("rmdir")
        .arg("/q")
        .arg(path)
        .creation_flags(CREATE_NO_WINDOW)
        .output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "rmdir '{}': {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Clear read-only attributes below `path` (not following links).
///
/// Returns `true` if any attribute was changed, i.e. a retry may succeed.
#[cfg(windows)]
fn clear_readonly(path: &Path) -> bool {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return false;
    };
    let mut changed = false;
    if meta.is_dir() && !is_link(&meta) {
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.flatten() {
                changed |= clear_readonly(&entry.path());
            }
        }
    }
    let mut perms = meta.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        changed |= std::fs::set_permissions(path, perms).is_ok();
    }
    changed
}

/// Deletion permission on Unix comes from the parent directory, not the
/// entry's own mode bits, so there is nothing to clear.
#[cfg(not(windows))]
const fn clear_readonly(_path: &Path) -> bool {
    false
}

/// Create a link at `link` pointing to `target`.
///
/// Directory targets get a directory link and file targets a file symlink;
/// on Windows a uniform symlink call fails across that boundary.  When
/// Windows refuses symlinks (no Developer Mode, not elevated), directories
/// fall back to an NTFS junction via `mklink /J`.
///
/// # Errors
///
/// Returns an error if no link could be created.
pub fn create_link(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                target.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let is_dir = target.is_dir();
        let result = if is_dir {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        match result {
            Ok(()) => {}
            Err(e)
                if matches!(
                    e.raw_os_error(),
                    Some(ERROR_ACCESS_DENIED | ERROR_PRIVILEGE_NOT_HELD)
                ) =>
            {
                if is_dir {
                    create_junction(target, link)?;
                } else {
                    return Err(e).with_context(|| {
                        format!(
                            "Cannot create symlink for '{}'. Enable Developer Mode \
                             (Settings > System > For developers) or run as Administrator",
                            link.display()
                        )
                    });
                }
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("creating symlink {} -> {}", link.display(), target.display())
                });
            }
        }
    }

    Ok(())
}

/// Create an NTFS junction with `mklink /J`, which needs no privilege.
#[cfg(windows)]
fn create_junction(target: &Path, link: &Path) -> Result<()> {
    use std::os::windows::process::CommandExt;
    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg("mklink")
        .arg("/J")
        .arg(link)
        .arg(target)
        .creation_flags(CREATE_NO_WINDOW)
        .output()
        .context("failed to run mklink /J")?;
    if !output.status.success() {
        anyhow::bail!(
            "Cannot create symlink or junction for '{}': {}",
            link.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
