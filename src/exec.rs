//! External command execution.
//!
//! Everything the tool needs from `git` and the package managers goes
//! through the [`Executor`] trait: a program name, an argument list, and back
//! an exit status plus captured output.
use std::path::Path;
use std::process::{Command, Output};

use crate::error::ExecError;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Combined, trimmed stdout and stderr.
    ///
    /// winget and choco write most diagnostics to stdout, so failure details
    /// are only useful when both streams are shown.
    #[must_use]
    pub fn detail(&self) -> String {
        let out = self.stdout.trim();
        let err = self.stderr.trim();
        match (out.is_empty(), err.is_empty()) {
            (true, _) => err.to_string(),
            (false, true) => out.to_string(),
            (false, false) => format!("{out}\n{err}"),
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution, injectable for tests.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] if the program cannot be started and
    /// [`ExecError::Failed`] if it exits unsuccessfully.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult, ExecError>;

    /// Run a command in a specific directory. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Same as [`Executor::run`].
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult, ExecError>;

    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Spawn`] if the program cannot be started.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, ExecError>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

/// Execute a command and return the result, failing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult, ExecError> {
    let output = cmd.output().map_err(|source| ExecError::Spawn {
        program: label.to_string(),
        source,
    })?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(ExecError::Failed {
            program: label.to_string(),
            code: result.code.unwrap_or(-1),
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result)
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult, ExecError> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute_checked(cmd, program)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult, ExecError> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        execute_checked(cmd, &format!("{program} in {}", dir.display()))
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult, ExecError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
