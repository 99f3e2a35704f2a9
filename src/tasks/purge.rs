use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::purge::{self, PurgeOptions, PurgeRequest};

/// Delete temporary files matching the configured purge patterns, or an
/// explicit override list.
#[derive(Debug)]
pub struct PurgePaths {
    patterns: Option<Vec<PurgeRequest>>,
}

impl PurgePaths {
    /// Purge the patterns from the configuration's `[purge]` table.
    #[must_use]
    pub const fn configured() -> Self {
        Self { patterns: None }
    }

    /// Purge exactly `patterns`, ignoring the configuration.
    #[must_use]
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: Some(patterns.into_iter().map(PurgeRequest::new).collect()),
        }
    }

    fn requests<'a>(&'a self, ctx: &'a Context) -> &'a [PurgeRequest] {
        self.patterns.as_deref().unwrap_or(&ctx.config.purge)
    }
}

impl Task for PurgePaths {
    fn name(&self) -> &'static str {
        "Purge temporary files"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let requests = self.requests(ctx);
        if requests.is_empty() {
            return Ok(TaskResult::Skipped("no purge patterns configured".to_string()));
        }

        let options = PurgeOptions {
            dry_run: ctx.dry_run,
        };
        let mut failed = 0usize;
        for request in requests {
            let summary = purge::purge(request, options, &ctx.env, ctx.fs_ops.as_ref());
            let line = format!("{}: {}", summary.pattern, summary.describe(ctx.dry_run));
            if ctx.dry_run {
                ctx.log.dry_run(&line);
            } else {
                ctx.log.info(&line);
            }
            for failure in &summary.failures {
                ctx.log.debug(&format!(
                    "cannot delete {}: {}",
                    failure.path.display(),
                    failure.error
                ));
            }
            failed += summary.failed;
            ctx.report(|r| r.purge.push(summary));
        }

        // Locked temp files are routine; they never fail the run.
        if failed > 0 {
            ctx.log
                .warn(&format!("{failed} item(s) could not be deleted (in use?)"));
        }
        Ok(TaskResult::done(ctx.dry_run))
    }
}
