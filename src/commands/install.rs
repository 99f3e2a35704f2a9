//! Install command implementation.
use anyhow::Result;
use std::sync::Arc;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::expand::Environment;
use crate::logging::{Log, Logger};
use crate::tasks;

/// Run the install command: sync the store, install packages, reconcile
/// links and purge temporary files.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any task fails.
pub fn run(
    global: &GlobalOpts,
    opts: &InstallOpts,
    env: &Environment,
    log: &Arc<Logger>,
) -> Result<()> {
    log.info(&format!("provision {}", super::version::VERSION));

    let setup = super::CommandSetup::init(global, env, log)?;
    let ctx = setup.into_context(Arc::clone(log) as Arc<dyn Log>, global.dry_run);

    let all_tasks = tasks::all_install_tasks();
    let selected = super::filter_tasks(&all_tasks, &opts.skip, &opts.only);
    super::run_tasks_to_completion(selected, &ctx, log, global.json)
}
