use anyhow::{Result, bail};

use super::{Context, Task, TaskResult};
use crate::resources::package::{self, PackageOutcome};

/// Install configured packages through winget, choco or scoop.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.supports_packages()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if ctx.config.packages.is_empty() {
            return Ok(TaskResult::Skipped("no packages configured".to_string()));
        }

        ctx.log.debug(&format!(
            "{} packages to process",
            ctx.config.packages.len()
        ));

        let mut installed = 0u32;
        let mut already = 0u32;
        let mut missing_manager = 0u32;
        let mut failed = 0u32;

        for spec in &ctx.config.packages {
            let result = package::install(spec, ctx.dry_run, ctx.executor.as_ref());
            let label = format!("{} ({})", result.id, result.manager);
            match result.outcome {
                PackageOutcome::Installed if ctx.dry_run => {
                    installed += 1;
                    ctx.log.dry_run(&format!("would install {label}"));
                }
                PackageOutcome::Installed => {
                    installed += 1;
                    ctx.log.info(&format!("installed {label}"));
                }
                PackageOutcome::AlreadyInstalled => {
                    already += 1;
                    ctx.log.debug(&format!("ok: {label} (already installed)"));
                }
                PackageOutcome::ManagerMissing => {
                    missing_manager += 1;
                    ctx.log.warn(&format!(
                        "{label}: {} not found on PATH",
                        result.manager.program()
                    ));
                }
                PackageOutcome::Failed => {
                    failed += 1;
                    ctx.log.warn(&format!(
                        "failed to install {label}: {}",
                        result.detail.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
            ctx.report(|r| r.packages.push(result));
        }

        let verb = if ctx.dry_run {
            "would install"
        } else {
            "installed"
        };
        ctx.log.info(&format!(
            "{installed} {verb}, {already} already installed, {missing_manager} manager missing, {failed} failed"
        ));

        if failed > 0 {
            bail!("{failed} package(s) failed to install");
        }
        Ok(TaskResult::done(ctx.dry_run))
    }
}
