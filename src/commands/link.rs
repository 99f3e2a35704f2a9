//! Link command implementation.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, LinkOpts};
use crate::expand::Environment;
use crate::logging::{Log, Logger};
use crate::resources::link::LinkOptions;
use crate::tasks::Task;
use crate::tasks::links::ReconcileLinks;

/// Merge command-line flags into the configured link policy.
///
/// Flags can only switch behaviour on; `--backup` implies `--overwrite`.
#[must_use]
pub const fn merge_options(configured: LinkOptions, opts: LinkOpts) -> LinkOptions {
    let backup = configured.backup || opts.backup;
    LinkOptions {
        overwrite: configured.overwrite || opts.overwrite || backup,
        backup,
        dry_run: configured.dry_run,
    }
}

/// Run the link command: reconcile configured links only.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any link fails.
pub fn run(global: &GlobalOpts, opts: LinkOpts, env: &Environment, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, env, log)?;
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>, global.dry_run);
    let options = merge_options(ctx.link_options, opts);
    let ctx = ctx.with_link_options(options);

    let task: &dyn Task = &ReconcileLinks;
    super::run_tasks_to_completion([task], &ctx, log, global.json)
}
