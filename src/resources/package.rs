//! Package installation resource.
use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// Supported package managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Windows Package Manager (winget).
    #[default]
    Winget,
    /// Chocolatey (choco).
    Choco,
    /// Scoop.
    Scoop,
}

impl PackageManager {
    /// Executable name on `PATH`.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Winget => "winget",
            Self::Choco => "choco",
            Self::Scoop => "scoop",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program())
    }
}

/// A package to install, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    /// Package identifier (winget ID, choco or scoop package name).
    pub id: String,
    /// Manager used to install it.
    #[serde(default)]
    pub manager: PackageManager,
    /// Extra arguments appended to the install command.
    #[serde(default)]
    pub args: Vec<String>,
}

impl PackageSpec {
    /// A winget package with no extra arguments.
    #[must_use]
    pub fn winget(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            manager: PackageManager::Winget,
            args: Vec::new(),
        }
    }
}

/// A system package resource that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// What to install.
    pub spec: &'a PackageSpec,
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(spec: &'a PackageSpec, executor: &'a dyn Executor) -> Self {
        Self { spec, executor }
    }

    fn install_args(&self) -> Vec<&str> {
        let id = self.spec.id.as_str();
        let mut args = match self.spec.manager {
            PackageManager::Winget => vec![
                "install",
                "--id",
                id,
                "--exact",
                "--accept-source-agreements",
                "--accept-package-agreements",
                "--disable-interactivity",
            ],
            PackageManager::Choco => vec!["install", id, "-y"],
            PackageManager::Scoop => vec!["install", id],
        };
        args.extend(self.spec.args.iter().map(String::as_str));
        args
    }
}

impl Resource for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.spec.id, self.spec.manager)
    }

    fn current_state(&self) -> Result<ResourceState> {
        let id = self.spec.id.as_str();
        let installed = match self.spec.manager {
            PackageManager::Winget => {
                let result = self.executor.run_unchecked(
                    "winget",
                    &[
                        "list",
                        "--id",
                        id,
                        "--exact",
                        "--accept-source-agreements",
                        "--disable-interactivity",
                    ],
                )?;
                result.success && result.stdout.contains(id)
            }
            PackageManager::Choco => {
                // --limit-output prints "name|version" per installed package.
                let result = self
                    .executor
                    .run_unchecked("choco", &["list", "--exact", id, "--limit-output"])?;
                result.success
                    && result.stdout.lines().any(|line| {
                        line.split('|')
                            .next()
                            .is_some_and(|name| name.eq_ignore_ascii_case(id))
                    })
            }
            PackageManager::Scoop => self.executor.run_unchecked("scoop", &["prefix", id])?.success,
        };
        Ok(if installed {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        let program = self.spec.manager.program();
        let result = self.executor.run_unchecked(program, &self.install_args())?;
        if result.success {
            Ok(ResourceChange::Applied)
        } else {
            Ok(ResourceChange::Skipped {
                reason: format!("{program} install failed: {}", result.detail()),
            })
        }
    }
}

/// Outcome of installing one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOutcome {
    /// The installer ran and succeeded (or would run, in a dry run).
    Installed,
    /// The package was already present.
    AlreadyInstalled,
    /// The package manager is not on `PATH`.
    ManagerMissing,
    /// The query or installer failed.
    Failed,
}

/// Result of installing one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageResult {
    /// Package identifier.
    pub id: String,
    /// Manager used.
    pub manager: PackageManager,
    /// What happened.
    pub outcome: PackageOutcome,
    /// Installer output or error message for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Ensure one package is installed. Never returns an error; failures are
/// captured in the result.
#[must_use]
pub fn install(spec: &PackageSpec, dry_run: bool, executor: &dyn Executor) -> PackageResult {
    let result = |outcome, detail| PackageResult {
        id: spec.id.clone(),
        manager: spec.manager,
        outcome,
        detail,
    };

    if !executor.which(spec.manager.program()) {
        return result(PackageOutcome::ManagerMissing, None);
    }

    let resource = PackageResource::new(spec, executor);
    match resource.current_state() {
        Ok(ResourceState::Correct) => return result(PackageOutcome::AlreadyInstalled, None),
        Ok(_) => {}
        Err(e) => return result(PackageOutcome::Failed, Some(format!("{e:#}"))),
    }

    if dry_run {
        return result(PackageOutcome::Installed, None);
    }

    match resource.apply() {
        Ok(ResourceChange::Skipped { reason }) => result(PackageOutcome::Failed, Some(reason)),
        Ok(_) => result(PackageOutcome::Installed, None),
        Err(e) => result(PackageOutcome::Failed, Some(format!("{e:#}"))),
    }
}
