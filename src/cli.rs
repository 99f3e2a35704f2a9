//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the provisioning tool.
#[derive(Parser, Debug)]
#[command(
    name = "provision",
    about = "Windows machine provisioning: dotfile links, packages and temp cleanup",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Configuration file (default: $PROVISION_CONFIG, ./provision.toml, or next to the binary)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print structured results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync the store, install packages, reconcile links and purge temp files
    Install(InstallOpts),
    /// Reconcile configured links only
    Link(LinkOpts),
    /// Remove configured links, restoring backups
    Unlink,
    /// Delete temporary files matching the configured (or given) patterns
    Purge(PurgeOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Link(_) => "link",
            Self::Unlink => "unlink",
            Self::Purge(_) => "purge",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Skip specific tasks
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only specific tasks
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}

/// Options for the `link` subcommand.
#[derive(Parser, Debug, Clone, Copy)]
pub struct LinkOpts {
    /// Replace existing files that are not the correct link
    #[arg(long)]
    pub overwrite: bool,

    /// Keep replaced files as <name>.bak (implies --overwrite)
    #[arg(long)]
    pub backup: bool,
}

/// Options for the `purge` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PurgeOpts {
    /// Patterns to purge instead of the configured ones
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["provision", "link", "-d", "--config", "p.toml", "--json"]);
        assert!(cli.global.dry_run);
        assert!(cli.global.json);
        assert_eq!(cli.global.config, Some(PathBuf::from("p.toml")));
        assert!(matches!(cli.command, Command::Link(_)));
    }

    #[test]
    fn parse_install_skip_and_only() {
        let cli = Cli::parse_from(["provision", "install", "--skip", "packages,purge"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.skip, vec!["packages", "purge"]);

        let cli = Cli::parse_from(["provision", "install", "--only", "links"]);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.only, vec!["links"]);
    }

    #[test]
    fn parse_link_flags() {
        let cli = Cli::parse_from(["provision", "link", "--overwrite", "--backup"]);
        let Command::Link(opts) = cli.command else {
            panic!("expected link");
        };
        assert!(opts.overwrite);
        assert!(opts.backup);
    }

    #[test]
    fn parse_purge_patterns() {
        let cli = Cli::parse_from(["provision", "purge", "%TEMP%", "C:/Windows/Temp/*"]);
        let Command::Purge(opts) = cli.command else {
            panic!("expected purge");
        };
        assert_eq!(opts.patterns, vec!["%TEMP%", "C:/Windows/Temp/*"]);
    }

    #[test]
    fn command_names() {
        assert_eq!(Cli::parse_from(["provision", "unlink"]).command.name(), "unlink");
        assert_eq!(Cli::parse_from(["provision", "-v", "version"]).command.name(), "version");
    }
}
