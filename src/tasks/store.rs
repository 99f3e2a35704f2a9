use anyhow::{Context as _, Result};

use super::{Context, Task, TaskResult};

/// Clone the dotfiles store, or fast-forward it when it already exists.
#[derive(Debug)]
pub struct SyncStore;

impl Task for SyncStore {
    fn name(&self) -> &'static str {
        "Sync store"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.store.repository.is_some() && ctx.config.store.path.is_some()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let (Some(repository), Some(path)) = (
            ctx.config.store.repository.as_deref(),
            ctx.config.store_path(&ctx.env),
        ) else {
            return Ok(TaskResult::Skipped("no store configured".to_string()));
        };

        if !ctx.executor.which("git") {
            return Ok(TaskResult::Skipped("git not found".to_string()));
        }

        if !path.exists() {
            if ctx.dry_run {
                ctx.log
                    .dry_run(&format!("git clone {repository} {}", path.display()));
                return Ok(TaskResult::DryRun);
            }
            let target = path.to_string_lossy();
            ctx.executor
                .run("git", &["clone", repository, &target])
                .with_context(|| format!("cloning {repository}"))?;
            ctx.log.info(&format!("cloned store into {}", path.display()));
            return Ok(TaskResult::Ok);
        }

        if !path.join(".git").exists() {
            return Ok(TaskResult::Skipped(format!(
                "{} is not a git work tree",
                path.display()
            )));
        }

        if ctx.dry_run {
            ctx.log.dry_run("git pull --ff-only");
            return Ok(TaskResult::DryRun);
        }

        ctx.log.debug(&format!("pulling in {}", path.display()));
        match ctx.executor.run_in(&path, "git", &["pull", "--ff-only"]) {
            Ok(r) => {
                let msg = r.stdout.trim().to_string();
                ctx.log.debug(&format!("git pull output: {msg}"));
                if msg.contains("Already up to date") {
                    ctx.log.info("already up to date");
                } else {
                    ctx.log.info("store updated");
                }
                Ok(TaskResult::Ok)
            }
            Err(e) => {
                ctx.log.warn(&format!("git pull failed: {e:#}"));
                Ok(TaskResult::Skipped("git pull failed".to_string()))
            }
        }
    }
}
