//! Top-level subcommand orchestration.
pub mod install;
pub mod link;
pub mod purge;
pub mod unlink;
pub mod version;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::ConfigError;
use crate::exec::SystemExecutor;
use crate::expand::Environment;
use crate::logging::{Log, Logger};
use crate::operations::SystemFileSystemOps;
use crate::platform::Platform;
use crate::tasks::{self, Context, RunReport, Task};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, configuration lookup and loading so that
/// each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Loaded configuration.
    pub config: Config,
    /// Environment snapshot used for expansion.
    pub env: Environment,
}

impl CommandSetup {
    /// Locate and load the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration file can be found or it fails to
    /// load.
    pub fn init(global: &GlobalOpts, env: &Environment, log: &Logger) -> Result<Self> {
        let path = locate_config(global, env)?;
        Self::load(&path, env, log)
    }

    /// Like [`CommandSetup::init`], but fall back to an empty configuration
    /// when no file is found and none was named explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but fails to load.
    pub fn init_optional(global: &GlobalOpts, env: &Environment, log: &Logger) -> Result<Self> {
        match locate_config(global, env) {
            Ok(path) => Self::load(&path, env, log),
            Err(e) if matches!(e.downcast_ref::<ConfigError>(), Some(ConfigError::NotFound)) => {
                log.debug("no configuration file found, using defaults");
                Ok(Self {
                    platform: Platform::detect(),
                    config: Config::default(),
                    env: env.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn load(path: &Path, env: &Environment, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();

        log.stage("Loading configuration");
        log.info(&format!("config: {}", path.display()));
        let config = Config::load(path, env)?;

        log.debug(&format!("{} links", config.links.len()));
        log.debug(&format!("{} packages", config.packages.len()));
        log.debug(&format!("{} purge patterns", config.purge.len()));
        log.info(&format!(
            "loaded {} links, {} packages, {} purge patterns",
            config.links.len(),
            config.packages.len(),
            config.purge.len()
        ));

        Ok(Self {
            platform,
            config,
            env: env.clone(),
        })
    }

    /// Build a task [`Context`] backed by the real system.
    #[must_use]
    pub fn into_context(self, log: Arc<dyn Log>, dry_run: bool) -> Context {
        Context::new(
            Arc::new(self.config),
            Arc::new(self.platform),
            log,
            dry_run,
            Arc::new(self.env),
            Arc::new(SystemExecutor),
            Arc::new(SystemFileSystemOps),
        )
    }
}

fn locate_config(global: &GlobalOpts, env: &Environment) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    Ok(config::resolve_config_path(
        global.config.as_deref(),
        env,
        &cwd,
        exe_dir.as_deref(),
    )?)
}

/// Keep tasks selected by `--only`, or not excluded by `--skip`.
///
/// Both match case-insensitive substrings of the task name; `--only` wins
/// when both are given.
#[must_use]
pub fn filter_tasks<'a>(
    all: &'a [Box<dyn Task>],
    skip: &[String],
    only: &[String],
) -> Vec<&'a dyn Task> {
    all.iter()
        .filter(|t| {
            let name = t.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            if !skip.is_empty() {
                return !skip.iter().any(|s| name.contains(&s.to_lowercase()));
            }
            true
        })
        .map(AsRef::as_ref)
        .collect()
}

/// Execute every task in order, print the summary (and the JSON report when
/// requested), and bail if any task failed.
///
/// # Errors
///
/// Returns an error if one or more tasks recorded a failure, or the JSON
/// report cannot be written.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
    json: bool,
) -> Result<()> {
    for task in tasks {
        tasks::execute(task, ctx);
    }

    log.print_summary();

    if json {
        write_report(&ctx.report_snapshot(), &mut std::io::stdout().lock())?;
    }

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}

/// Write the run report as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_report(report: &RunReport, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report).context("serializing run report")?;
    writeln!(out).context("writing run report")?;
    Ok(())
}
