// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace holding a store, a live
// configuration area and a `provision.toml`, so each integration test can set
// up an isolated environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use provision_cli::cli::GlobalOpts;
use provision_cli::expand::Environment;
use provision_cli::logging::Logger;

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `store/`          the dotfiles store that link targets point into
/// - `live/`           where applications expect their configuration
/// - `provision.toml`  written by [`TestWorkspace::write_config`]
pub struct TestWorkspace {
    /// Temporary directory containing the workspace.
    pub root: tempfile::TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace with `store/` and `live/` directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("store")).expect("create store dir");
        std::fs::create_dir_all(root.path().join("live")).expect("create live dir");
        Self { root }
    }

    /// Path to the workspace root.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Path to the store directory.
    pub fn store(&self) -> PathBuf {
        self.root.path().join("store")
    }

    /// Path to the live configuration directory.
    pub fn live(&self) -> PathBuf {
        self.root.path().join("live")
    }

    /// Path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("provision.toml")
    }

    /// Write a file under the store, creating parent directories.
    pub fn store_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.store().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create store parent");
        }
        std::fs::write(&path, content).expect("write store file");
        path
    }

    /// Write `provision.toml`. `{root}` is replaced with the workspace root
    /// so TOML literal strings can name paths inside it.
    pub fn write_config(&self, template: &str) {
        let content = template.replace("{root}", &self.path().to_string_lossy());
        std::fs::write(self.config_path(), content).expect("write provision.toml");
    }

    /// Global options pointing at this workspace's configuration.
    pub fn global(&self, dry_run: bool) -> GlobalOpts {
        GlobalOpts {
            dry_run,
            config: Some(self.config_path()),
            json: false,
        }
    }
}

/// An environment that resolves nothing, so tests never depend on the host.
pub fn empty_env() -> Environment {
    Environment::from_pairs(Vec::<(String, String)>::new())
}

/// A logger that writes no log file.
pub fn logger() -> Arc<Logger> {
    Arc::new(Logger::new(None))
}
