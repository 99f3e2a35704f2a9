//! Loading and locating `provision.toml`.
pub mod links;
pub mod packages;
pub mod purge;
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::expand::Environment;
use crate::purge::PurgeRequest;
use crate::resources::link::LinkSpec;
use crate::resources::package::PackageSpec;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "provision.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "PROVISION_CONFIG";

/// `[store]` table: the local clone of the dotfiles repository.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Where the store lives (unexpanded).
    pub path: Option<String>,
    /// Git URL to clone the store from when it is missing.
    pub repository: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    links: links::LinksSection,
    #[serde(default)]
    packages: Vec<PackageSpec>,
    #[serde(default)]
    purge: purge::PurgeSection,
}

/// Fully loaded configuration.
#[derive(Debug, Default, Clone)]
pub struct Config {
    /// File the configuration was read from.
    pub path: PathBuf,
    /// Store settings.
    pub store: StoreConfig,
    /// Replace existing entries that are not the correct link.
    pub overwrite: bool,
    /// Keep replaced entries as `<name>.bak`.
    pub backup: bool,
    /// Links to reconcile, targets already rooted at the store.
    pub links: Vec<LinkSpec>,
    /// Packages to install.
    pub packages: Vec<PackageSpec>,
    /// Purge patterns.
    pub purge: Vec<PurgeRequest>,
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, is not valid
    /// TOML, has unknown keys, or contains an empty link or package entry.
    pub fn load(path: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml_loader::load_config(path)?;
        Self::from_raw(raw, path, env)
    }

    /// Parse configuration from TOML text (`path` is used for messages).
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus I/O.
    pub fn parse(content: &str, path: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml_loader::parse(content, path)?;
        Self::from_raw(raw, path, env)
    }

    fn from_raw(raw: RawConfig, path: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        if let Some(i) = links::first_invalid(&raw.links.entries) {
            return Err(invalid(format!(
                "links.entries[{i}]: path and target must not be empty"
            )));
        }
        if let Some(message) = packages::validate(&raw.packages) {
            return Err(invalid(message));
        }

        let links = links::resolve(&raw.links.entries, raw.store.path.as_deref(), env);
        Ok(Self {
            path: path.to_path_buf(),
            overwrite: raw.links.overwrite,
            backup: raw.links.backup,
            links,
            packages: raw.packages,
            purge: raw.purge.requests(),
            store: raw.store,
        })
    }

    /// Expanded store path, if configured.
    #[must_use]
    pub fn store_path(&self, env: &Environment) -> Option<PathBuf> {
        self.store.path.as_deref().map(|p| env.expand_path(p))
    }
}

/// Locate the configuration file.
///
/// Search order: `explicit` (from `--config`), `$PROVISION_CONFIG`,
/// `provision.toml` in `cwd`, then `provision.toml` next to the executable.
/// An explicitly named file is returned even if it does not exist, so the
/// caller reports the real I/O error.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if no candidate exists.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env: &Environment,
    cwd: &Path,
    exe_dir: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env.get(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(env.expand_path(path));
    }
    [Some(cwd), exe_dir]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
        .ok_or(ConfigError::NotFound)
}
