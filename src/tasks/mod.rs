//! Named tasks that feed configuration into the engines and log the results.
/// Shared execution context and run report.
pub mod context;
/// Link reconciliation task.
pub mod links;
/// Package installation task.
pub mod packages;
/// Temporary file purge task.
pub mod purge;
/// Dotfiles store synchronisation task.
pub mod store;

pub use context::{Context, RunReport};

use anyhow::Result;

use crate::logging::{TaskEntry, TaskStatus};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use provision_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("nothing configured".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped, with the reason.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

impl TaskResult {
    /// `DryRun` when `dry_run` is set, otherwise `Ok`.
    #[must_use]
    pub const fn done(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Ok }
    }
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task should run on the current platform and configuration.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task cannot run at all, or if any of its items
    /// failed in a way the run summary must report.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// The tasks run by the install command, in execution order.
#[must_use]
pub fn all_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(store::SyncStore),
        Box::new(packages::InstallPackages),
        Box::new(links::ReconcileLinks),
        Box::new(purge::PurgePaths::configured()),
    ]
}

/// Execute a task, recording the result in the logger and the run report.
pub fn execute(task: &dyn Task, ctx: &Context) {
    let (status, message) = if task.should_run(ctx) {
        ctx.log.stage(task.name());
        match task.run(ctx) {
            Ok(TaskResult::Ok) => (TaskStatus::Ok, None),
            Ok(TaskResult::Skipped(reason)) => {
                ctx.log.info(&format!("skipped: {reason}"));
                (TaskStatus::Skipped, Some(reason))
            }
            Ok(TaskResult::DryRun) => (TaskStatus::DryRun, None),
            Err(e) => {
                ctx.log.error(&format!("{}: {e:#}", task.name()));
                (TaskStatus::Failed, Some(format!("{e:#}")))
            }
        }
    } else {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        (TaskStatus::NotApplicable, None)
    };

    ctx.log.record_task(task.name(), status, message.as_deref());
    ctx.report(|r| {
        r.tasks.push(TaskEntry {
            name: task.name().to_string(),
            status,
            message,
        });
    });
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use super::test_helpers::{empty_config, make_context};

    /// A mock task for testing `execute()`.
    struct MockTask {
        name: &'static str,
        should_run: bool,
        result: Result<TaskResult, String>,
    }

    impl Task for MockTask {
        fn name(&self) -> &str {
            self.name
        }
        fn should_run(&self, _ctx: &Context) -> bool {
            self.should_run
        }
        fn run(&self, _ctx: &Context) -> Result<TaskResult> {
            self.result.clone().map_err(|s| anyhow::anyhow!("{s}"))
        }
    }

    #[test]
    fn execute_records_not_applicable_without_running() {
        let (ctx, log) = make_context(empty_config());
        let task = MockTask {
            name: "skip-me",
            should_run: false,
            result: Err("must not run".to_string()),
        };

        execute(&task, &ctx);

        assert_eq!(log.tasks()[0].1, TaskStatus::NotApplicable);
        assert!(!log.contains("must not run"));
    }

    #[test]
    fn execute_records_each_result_kind() {
        let (ctx, log) = make_context(empty_config());
        for (name, result) in [
            ("ok", Ok(TaskResult::Ok)),
            ("skip", Ok(TaskResult::Skipped("nothing to do".to_string()))),
            ("dry", Ok(TaskResult::DryRun)),
            ("fail", Err("boom".to_string())),
        ] {
            execute(
                &MockTask {
                    name,
                    should_run: true,
                    result,
                },
                &ctx,
            );
        }

        let statuses: Vec<TaskStatus> = log.tasks().iter().map(|t| t.1).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Ok,
                TaskStatus::Skipped,
                TaskStatus::DryRun,
                TaskStatus::Failed
            ]
        );
        assert_eq!(log.tasks()[3].2.as_deref(), Some("boom"));
        assert!(log.contains("error: fail: boom"));
        assert!(log.contains("info: skipped: nothing to do"));

        let report = ctx.report_snapshot();
        assert_eq!(report.tasks.len(), 4);
        assert_eq!(report.tasks[1].message.as_deref(), Some("nothing to do"));
    }

    #[test]
    fn install_task_order() {
        let names: Vec<String> = all_install_tasks()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "Sync store",
                "Install packages",
                "Reconcile links",
                "Purge temporary files"
            ]
        );
    }
}
