use anyhow::{Result, bail};

use super::{Context, Task, TaskResult};
use crate::resources::link::{self, LinkOutcome, UnlinkOutcome};

/// Reconcile every configured link.
#[derive(Debug)]
pub struct ReconcileLinks;

impl Task for ReconcileLinks {
    fn name(&self) -> &'static str {
        "Reconcile links"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.links.is_empty() {
            return Ok(TaskResult::Skipped("no links configured".to_string()));
        }

        let options = ctx.link_options;
        let report = link::reconcile_all(&ctx.config.links, options, &ctx.env);

        for result in &report.results {
            let path = result.path.display();
            let target = result.target.display();
            match result.outcome {
                LinkOutcome::Created if ctx.dry_run => {
                    ctx.log.dry_run(&format!("would link {path} -> {target}"));
                }
                LinkOutcome::Created => ctx.log.info(&format!("linked {path} -> {target}")),
                LinkOutcome::AlreadyCorrect => ctx.log.debug(&format!("ok: {path}")),
                LinkOutcome::SkippedTargetMissing => {
                    ctx.log
                        .warn(&format!("skipping {path}: target missing ({target})"));
                }
                LinkOutcome::SkippedExists => ctx.log.warn(&format!(
                    "skipping {path}: already exists (use --overwrite or --backup)"
                )),
                LinkOutcome::Failed => ctx.log.error(&format!(
                    "failed to link {path}: {}",
                    result.error.as_deref().unwrap_or("unknown error")
                )),
            }
        }

        let counts = report.counts;
        ctx.log.info(&counts.summary(ctx.dry_run));
        ctx.report(|r| r.links = Some(report));

        if counts.failed > 0 {
            bail!("{} link(s) failed", counts.failed);
        }
        Ok(TaskResult::done(ctx.dry_run))
    }
}

/// Remove every configured link that points into the store.
#[derive(Debug)]
pub struct RemoveLinks;

impl Task for RemoveLinks {
    fn name(&self) -> &'static str {
        "Remove links"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.links.is_empty() {
            return Ok(TaskResult::Skipped("no links configured".to_string()));
        }

        let mut removed = 0u32;
        let mut failed = 0u32;
        for spec in &ctx.config.links {
            let result = link::unlink(spec, ctx.dry_run, &ctx.env);
            let path = result.path.display();
            let restored = if result.restored_backup {
                " (backup restored)"
            } else {
                ""
            };
            match result.outcome {
                UnlinkOutcome::Removed if ctx.dry_run => {
                    removed += 1;
                    ctx.log.dry_run(&format!("would remove {path}{restored}"));
                }
                UnlinkOutcome::Removed => {
                    removed += 1;
                    ctx.log.info(&format!("removed {path}{restored}"));
                }
                UnlinkOutcome::NotLinked => ctx.log.debug(&format!("not linked: {path}")),
                UnlinkOutcome::Failed => {
                    failed += 1;
                    ctx.log.error(&format!(
                        "failed to remove {path}: {}",
                        result.error.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
            ctx.report(|r| r.unlinks.push(result));
        }

        let verb = if ctx.dry_run {
            "would remove"
        } else {
            "removed"
        };
        ctx.log.info(&format!("{removed} {verb}, {failed} failed"));

        if failed > 0 {
            bail!("{failed} link(s) could not be removed");
        }
        Ok(TaskResult::done(ctx.dry_run))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use crate::operations::SystemFileSystemOps;
    use crate::platform::Os;
    use crate::resources::link::{LinkOptions, LinkSpec};
    use crate::tasks::test_helpers::{context, empty_config, make_context};
    use std::path::Path;
    use std::sync::Arc;

    fn spec(path: &Path, target: &Path) -> LinkSpec {
        LinkSpec::new(
            path.to_string_lossy().into_owned(),
            target.to_string_lossy().into_owned(),
        )
    }

    fn config_with(links: Vec<LinkSpec>) -> crate::config::Config {
        let mut config = empty_config();
        config.links = links;
        config
    }

    #[test]
    fn skips_when_nothing_configured() {
        let (ctx, _log) = make_context(empty_config());
        assert!(matches!(
            ReconcileLinks.run(&ctx).unwrap(),
            TaskResult::Skipped(_)
        ));
        assert!(matches!(
            RemoveLinks.run(&ctx).unwrap(),
            TaskResult::Skipped(_)
        ));
    }

    #[test]
    fn missing_target_and_existing_file_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store").join("profile.ps1");
        let occupied = dir.path().join("occupied.txt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "store").unwrap();
        std::fs::write(&occupied, "user data").unwrap();
        let (ctx, log) = make_context(config_with(vec![
            spec(&dir.path().join("a"), &dir.path().join("store").join("nope")),
            spec(&occupied, &target),
        ]));

        let result = ReconcileLinks.run(&ctx).unwrap();

        assert!(matches!(result, TaskResult::Ok));
        assert!(log.contains("target missing"));
        assert!(log.contains("already exists (use --overwrite or --backup)"));
        assert!(log.contains("0 created, 0 already ok, 2 skipped, 0 failed"));
        assert_eq!(std::fs::read_to_string(&occupied).unwrap(), "user data");
        let report = ctx.report_snapshot().links.unwrap();
        assert_eq!(report.counts.skipped_exists, 1);
        assert_eq!(report.counts.skipped_target_missing, 1);
    }

    #[cfg(unix)]
    #[test]
    fn creates_then_removes_links_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store").join("settings.json");
        let path = dir.path().join("live").join("settings.json");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&target, "store").unwrap();
        std::fs::write(&path, "original").unwrap();

        let (ctx, log) = make_context(config_with(vec![spec(&path, &target)]));
        let ctx = ctx.with_link_options(LinkOptions {
            overwrite: true,
            backup: true,
            dry_run: false,
        });

        assert!(matches!(ReconcileLinks.run(&ctx).unwrap(), TaskResult::Ok));
        assert!(log.contains("linked "));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "store");

        assert!(matches!(RemoveLinks.run(&ctx).unwrap(), TaskResult::Ok));
        assert!(log.contains("(backup restored)"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
        assert!(!path.symlink_metadata().unwrap().file_type().is_symlink());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store").join("settings.json");
        let path = dir.path().join("live").join("settings.json");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "store").unwrap();

        let (ctx, log) = context(
            config_with(vec![spec(&path, &target)]),
            Os::Windows,
            true,
            Arc::new(MockExecutor::with_responses(vec![])),
            Arc::new(SystemFileSystemOps),
        );

        let result = ReconcileLinks.run(&ctx).unwrap();

        assert!(matches!(result, TaskResult::DryRun));
        assert!(log.contains("dry_run: would link "));
        assert!(log.contains("1 would create, 0 already ok, 0 skipped, 0 failed"));
        assert!(!dir.path().join("live").exists());
    }

    #[test]
    fn unlink_leaves_regular_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store.txt");
        let path = dir.path().join("live.txt");
        std::fs::write(&target, "store").unwrap();
        std::fs::write(&path, "user data").unwrap();
        let (ctx, log) = make_context(config_with(vec![spec(&path, &target)]));

        let result = RemoveLinks.run(&ctx).unwrap();

        assert!(matches!(result, TaskResult::Ok));
        assert!(log.contains("not linked: "));
        assert!(log.contains("0 removed, 0 failed"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "user data");
    }
}
