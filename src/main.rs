//! `provision` command-line entry point.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use provision_cli::cli::{Cli, Command};
use provision_cli::commands;
use provision_cli::expand::Environment;
use provision_cli::logging::{self, Logger};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        return commands::version::run();
    }

    let env = Environment::from_process();
    let log_file = logging::log_file_path(&env, args.command.name());
    logging::init_subscriber(args.verbose, args.global.json, log_file.as_deref());
    let log = Arc::new(Logger::new(log_file));

    match &args.command {
        Command::Install(opts) => commands::install::run(&args.global, opts, &env, &log),
        Command::Link(opts) => commands::link::run(&args.global, *opts, &env, &log),
        Command::Unlink => commands::unlink::run(&args.global, &env, &log),
        Command::Purge(opts) => commands::purge::run(&args.global, opts, &env, &log),
        Command::Version => commands::version::run(),
    }
}
