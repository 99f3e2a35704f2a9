//! Purge command implementation.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, PurgeOpts};
use crate::expand::Environment;
use crate::logging::{Log, Logger};
use crate::tasks::Task;
use crate::tasks::purge::PurgePaths;

/// Run the purge command.
///
/// Patterns given on the command line replace the configured ones, and then
/// no configuration file is required.
///
/// # Errors
///
/// Returns an error if configuration loading fails.
pub fn run(global: &GlobalOpts, opts: &PurgeOpts, env: &Environment, log: &Arc<Logger>) -> Result<()> {
    let (setup, task) = if opts.patterns.is_empty() {
        (
            super::CommandSetup::init(global, env, log)?,
            PurgePaths::configured(),
        )
    } else {
        (
            super::CommandSetup::init_optional(global, env, log)?,
            PurgePaths::with_patterns(opts.patterns.iter().cloned()),
        )
    };
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>, global.dry_run);

    let task: &dyn Task = &task;
    super::run_tasks_to_completion([task], &ctx, log, global.json)
}
