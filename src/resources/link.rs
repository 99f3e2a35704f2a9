//! Link reconciliation: make a live configuration path a link into the store.
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::helpers::fs;
use super::{Resource, ResourceChange, ResourceState};
use crate::expand::Environment;

/// A declarative link: `path` must be a link resolving to `target`.
///
/// Both fields are raw configuration strings and may contain unexpanded
/// environment references; they are expanded when reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Live location consumed by some application.
    pub path: String,
    /// Location inside the store that the link must resolve to.
    pub target: String,
}

impl LinkSpec {
    /// Create a new link spec.
    #[must_use]
    pub fn new(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
        }
    }

    /// Expand both paths against `env` and make them absolute.
    ///
    /// A link's text is resolved against the link's own directory, so a
    /// relative target must be anchored to the working directory first.
    #[must_use]
    pub fn resolve(&self, env: &Environment) -> LinkResource {
        LinkResource::new(
            absolute(env.expand_path(&self.path)),
            absolute(env.expand_path(&self.target)),
        )
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// Policy knobs for [`reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Replace an existing entry that is not already the correct link.
    pub overwrite: bool,
    /// When overwriting, keep the old entry as `<name>.bak` instead of deleting it.
    pub backup: bool,
    /// Report what would happen without touching the filesystem.
    pub dry_run: bool,
}

/// Outcome of reconciling one [`LinkSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// The link was created (or would be, in a dry run).
    Created,
    /// The link already pointed at the target.
    AlreadyCorrect,
    /// The target does not exist; nothing was done.
    SkippedTargetMissing,
    /// Something else occupies the path and overwriting is disabled.
    SkippedExists,
    /// An operation was attempted and failed.
    Failed,
}

impl std::fmt::Display for LinkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::AlreadyCorrect => "already correct",
            Self::SkippedTargetMissing => "target missing",
            Self::SkippedExists => "exists",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of reconciling one [`LinkSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkResult {
    /// Expanded link path.
    pub path: PathBuf,
    /// Expanded target path.
    pub target: PathBuf,
    /// What happened.
    pub outcome: LinkOutcome,
    /// Error message, for [`LinkOutcome::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkResult {
    fn new(resource: &LinkResource, outcome: LinkOutcome) -> Self {
        Self {
            path: resource.path.clone(),
            target: resource.target.clone(),
            outcome,
            error: None,
        }
    }

    fn failed(resource: &LinkResource, error: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{error:#}")),
            ..Self::new(resource, LinkOutcome::Failed)
        }
    }
}

/// Per-outcome counts for a batch of link results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounts {
    /// [`LinkOutcome::Created`]
    pub created: u32,
    /// [`LinkOutcome::AlreadyCorrect`]
    pub already_correct: u32,
    /// [`LinkOutcome::SkippedTargetMissing`]
    pub skipped_target_missing: u32,
    /// [`LinkOutcome::SkippedExists`]
    pub skipped_exists: u32,
    /// [`LinkOutcome::Failed`]
    pub failed: u32,
}

impl LinkCounts {
    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.created += 1,
            LinkOutcome::AlreadyCorrect => self.already_correct += 1,
            LinkOutcome::SkippedTargetMissing => self.skipped_target_missing += 1,
            LinkOutcome::SkippedExists => self.skipped_exists += 1,
            LinkOutcome::Failed => self.failed += 1,
        }
    }

    /// Format the summary line (e.g. "2 created, 5 already ok, 1 skipped, 0 failed").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would create" } else { "created" };
        format!(
            "{} {verb}, {} already ok, {} skipped, {} failed",
            self.created,
            self.already_correct,
            self.skipped_target_missing + self.skipped_exists,
            self.failed
        )
    }
}

/// Ordered results of a batch reconciliation plus their counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// One result per spec, in input order.
    pub results: Vec<LinkResult>,
    /// Aggregate counts per outcome.
    pub counts: LinkCounts,
}

impl LinkReport {
    /// Append a result and update the counts.
    pub fn push(&mut self, result: LinkResult) {
        self.counts.record(result.outcome);
        self.results.push(result);
    }
}

/// An expanded link that can be checked, created and removed.
#[derive(Debug, Clone)]
pub struct LinkResource {
    /// Where the link lives.
    pub path: PathBuf,
    /// What the link points to.
    pub target: PathBuf,
}

impl LinkResource {
    /// Create a new link resource.
    #[must_use]
    pub const fn new(path: PathBuf, target: PathBuf) -> Self {
        Self { path, target }
    }
}

impl Resource for LinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.path.display(), self.target.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.target.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("target does not exist: {}", self.target.display()),
            });
        }

        let Ok(meta) = self.path.symlink_metadata() else {
            return Ok(ResourceState::Missing);
        };

        if fs::is_link(&meta) {
            if fs::link_points_to(&self.path, &self.target) {
                return Ok(ResourceState::Correct);
            }
            let current = std::fs::read_link(&self.path).map_or_else(
                |_| "an unreadable link".to_string(),
                |p| format!("a link to {}", p.display()),
            );
            return Ok(ResourceState::Incorrect { current });
        }

        // Reached through a parent that already links into the store.
        if fs::same_entry(&self.path, &self.target) {
            return Ok(ResourceState::Correct);
        }

        let current = if meta.is_dir() {
            "a directory"
        } else {
            "a regular file"
        };
        Ok(ResourceState::Incorrect {
            current: current.to_string(),
        })
    }

    /// Create the link. The path must be clear.
    fn apply(&self) -> Result<ResourceChange> {
        fs::ensure_parent_dir(&self.path)?;
        fs::create_link(&self.target, &self.path)?;
        Ok(ResourceChange::Applied)
    }

    /// Remove the link, but only if it points at the target. A backup left
    /// by an earlier overwrite is moved back into place.
    fn remove(&self) -> Result<ResourceChange> {
        if !fs::link_points_to(&self.path, &self.target) {
            return Ok(ResourceChange::Skipped {
                reason: "not linked to target".to_string(),
            });
        }
        fs::remove_link(&self.path)?;
        restore_backup(&self.path)?;
        Ok(ResourceChange::Applied)
    }
}

fn restore_backup(path: &Path) -> Result<bool> {
    let backup = fs::backup_path(path);
    if !fs::entry_exists(&backup) {
        return Ok(false);
    }
    std::fs::rename(&backup, path)
        .map_err(|e| anyhow::anyhow!("restore {}: {e}", backup.display()))?;
    Ok(true)
}

/// Ensure `spec.path` is a link to `spec.target`.
///
/// Never returns an error: every failure is captured in the result so a
/// batch can continue with the next spec.
#[must_use]
pub fn reconcile(spec: &LinkSpec, options: LinkOptions, env: &Environment) -> LinkResult {
    let resource = spec.resolve(env);
    reconcile_resource(&resource, options)
}

fn reconcile_resource(resource: &LinkResource, options: LinkOptions) -> LinkResult {
    if !resource.target.exists() {
        return LinkResult::new(resource, LinkOutcome::SkippedTargetMissing);
    }

    if !options.dry_run
        && let Err(e) = fs::ensure_parent_dir(&resource.path)
    {
        return LinkResult::failed(resource, &e);
    }

    let state = match resource.current_state() {
        Ok(state) => state,
        Err(e) => return LinkResult::failed(resource, &e),
    };

    match state {
        ResourceState::Invalid { .. } => {
            return LinkResult::new(resource, LinkOutcome::SkippedTargetMissing);
        }
        ResourceState::Correct => {
            return LinkResult::new(resource, LinkOutcome::AlreadyCorrect);
        }
        ResourceState::Incorrect { .. } if !options.overwrite => {
            return LinkResult::new(resource, LinkOutcome::SkippedExists);
        }
        ResourceState::Incorrect { .. } if fs::would_destroy(&resource.path, &resource.target) => {
            let e = anyhow::anyhow!(
                "refusing to replace {}: it contains the link target",
                resource.path.display()
            );
            return LinkResult::failed(resource, &e);
        }
        ResourceState::Incorrect { .. } if !options.dry_run => {
            let cleared = if options.backup {
                fs::move_to_backup(&resource.path).map(|_| ())
            } else {
                fs::remove_entry(&resource.path).map_err(|e| {
                    anyhow::Error::new(e)
                        .context(format!("remove existing: {}", resource.path.display()))
                })
            };
            if let Err(e) = cleared {
                return LinkResult::failed(resource, &e);
            }
        }
        ResourceState::Incorrect { .. } | ResourceState::Missing => {}
    }

    if options.dry_run {
        return LinkResult::new(resource, LinkOutcome::Created);
    }

    match resource.apply() {
        Ok(_) => LinkResult::new(resource, LinkOutcome::Created),
        Err(e) => LinkResult::failed(resource, &e),
    }
}

/// Reconcile every spec in order, collecting a [`LinkReport`].
#[must_use]
pub fn reconcile_all(specs: &[LinkSpec], options: LinkOptions, env: &Environment) -> LinkReport {
    let mut report = LinkReport::default();
    for spec in specs {
        report.push(reconcile(spec, options, env));
    }
    report
}

/// Outcome of removing one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkOutcome {
    /// The link was removed (or would be, in a dry run).
    Removed,
    /// The path is not a link to the target; left alone.
    NotLinked,
    /// Removal was attempted and failed.
    Failed,
}

/// Result of removing one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlinkResult {
    /// Expanded link path.
    pub path: PathBuf,
    /// What happened.
    pub outcome: UnlinkOutcome,
    /// Whether a `<name>.bak` backup was moved back into place.
    pub restored_backup: bool,
    /// Error message, for [`UnlinkOutcome::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Remove `spec.path` if it is a link to `spec.target`, restoring any backup.
#[must_use]
pub fn unlink(spec: &LinkSpec, dry_run: bool, env: &Environment) -> UnlinkResult {
    let resource = spec.resolve(env);
    let result = |outcome, restored_backup, error| UnlinkResult {
        path: resource.path.clone(),
        outcome,
        restored_backup,
        error,
    };

    if !fs::link_points_to(&resource.path, &resource.target) {
        return result(UnlinkOutcome::NotLinked, false, None);
    }
    if dry_run {
        let has_backup = fs::entry_exists(&fs::backup_path(&resource.path));
        return result(UnlinkOutcome::Removed, has_backup, None);
    }
    if let Err(e) = fs::remove_link(&resource.path) {
        return result(UnlinkOutcome::Failed, false, Some(e.to_string()));
    }
    match restore_backup(&resource.path) {
        Ok(restored) => result(UnlinkOutcome::Removed, restored, None),
        Err(e) => result(UnlinkOutcome::Failed, false, Some(format!("{e:#}"))),
    }
}
