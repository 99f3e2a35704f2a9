//! Unlink command implementation.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::expand::Environment;
use crate::logging::{Log, Logger};
use crate::tasks::Task;
use crate::tasks::links::RemoveLinks;

/// Run the unlink command: remove configured links and restore backups.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any link cannot be
/// removed.
pub fn run(global: &GlobalOpts, env: &Environment, log: &Arc<Logger>) -> Result<()> {
    let setup = super::CommandSetup::init(global, env, log)?;
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>, global.dry_run);

    let task: &dyn Task = &RemoveLinks;
    super::run_tasks_to_completion([task], &ctx, log, global.json)
}
