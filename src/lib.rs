//! Windows machine provisioning engine.
//!
//! Declarative provisioning driven by a single `provision.toml`: links from
//! live configuration paths into a dotfiles store, packages through winget,
//! choco or scoop, and cleanup of temporary directories.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: locate, parse and validate `provision.toml`
//! - **[`resources`]**: idempotent `check + apply` primitives (links, packages)
//! - **[`purge`]**: the glob purge engine behind temp-file cleanup
//! - **[`tasks`]**: named units of work wired to resources and engines
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod expand;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod purge;
pub mod resources;
pub mod tasks;
