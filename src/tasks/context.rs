use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::Config;
use crate::exec::Executor;
use crate::expand::Environment;
use crate::logging::{Log, TaskEntry};
use crate::operations::FileSystemOps;
use crate::platform::Platform;
use crate::purge::PurgeSummary;
use crate::resources::link::{LinkOptions, LinkReport, UnlinkResult};
use crate::resources::package::PackageResult;

/// Structured results of a run, printed with `--json`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Task outcomes in execution order.
    pub tasks: Vec<TaskEntry>,
    /// Package installation results.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageResult>,
    /// Link reconciliation report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<LinkReport>,
    /// Link removal results.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unlinks: Vec<UnlinkResult>,
    /// One summary per purge pattern.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub purge: Vec<PurgeSummary>,
}

/// Shared context for task execution.
pub struct Context {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Environment snapshot used to expand configured paths.
    pub env: Arc<Environment>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Filesystem operation abstraction used by the purge engine.
    pub fs_ops: Arc<dyn FileSystemOps>,
    /// Link policy: configuration merged with command-line flags.
    pub link_options: LinkOptions,
    report: Mutex<RunReport>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config.path)
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &self.executor)
            .field("fs_ops", &self.fs_ops)
            .field("link_options", &self.link_options)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context for task execution.
    ///
    /// Link options start from the configuration's `[links]` policy.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        env: Arc<Environment>,
        executor: Arc<dyn Executor>,
        fs_ops: Arc<dyn FileSystemOps>,
    ) -> Self {
        let link_options = LinkOptions {
            overwrite: config.overwrite || config.backup,
            backup: config.backup,
            dry_run,
        };
        Self {
            config,
            platform,
            log,
            dry_run,
            env,
            executor,
            fs_ops,
            link_options,
            report: Mutex::new(RunReport {
                dry_run,
                ..RunReport::default()
            }),
        }
    }

    /// Return a new context with the given link options.
    #[must_use]
    pub fn with_link_options(mut self, options: LinkOptions) -> Self {
        self.link_options = LinkOptions {
            dry_run: self.dry_run,
            ..options
        };
        self
    }

    /// Return a new context with the given logger.
    #[must_use]
    pub fn with_log(mut self, log: Arc<dyn Log>) -> Self {
        self.log = log;
        self
    }

    /// Mutate the run report.
    pub fn report(&self, update: impl FnOnce(&mut RunReport)) {
        let mut guard = self
            .report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        update(&mut guard);
    }

    /// Snapshot of the run report.
    #[must_use]
    pub fn report_snapshot(&self) -> RunReport {
        self.report
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}
