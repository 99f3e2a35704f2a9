//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors ([`ConfigError`], [`ExecError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! The link reconciler and the purge engine never return these: their
//! per-item failures are captured as values in their result types.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError) — locating, reading, parsing provision.toml
//! └── Exec(ExecError)     — spawning external tools (git, winget, …)
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External command error.
    #[error("Command error: {0}")]
    Exec(#[from] ExecError),
}

/// Errors that arise from locating and loading `provision.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No configuration file could be found in any of the searched locations.
    #[error("cannot find provision.toml. Use --config or set PROVISION_CONFIG")]
    NotFound,

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected schema.
    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Underlying deserialization error.
        source: toml::de::Error,
    },

    /// The file parsed but contains an unusable entry.
    #[error("Invalid configuration in {path}: {message}")]
    Invalid {
        /// Path to the offending file.
        path: PathBuf,
        /// What is wrong.
        message: String,
    },
}

/// Errors that arise from invoking external programs.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to execute: {program}: {source}")]
    Spawn {
        /// Program (and working directory, if any) that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("{program} failed (exit {code}): {stderr}")]
    Failed {
        /// Program label.
        program: String,
        /// Exit code, or `-1` when terminated by a signal.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },
}
