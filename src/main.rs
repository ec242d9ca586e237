//! `intpkg` command-line entry point.
use anyhow::Result;
use clap::Parser;

use intpkg::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = logging::Logger::new();

    match args.command {
        cli::Command::Format(opts) => commands::format::run(&args.global, &opts, &log),
        cli::Command::Changelog(command) => {
            commands::changelog::run(&args.global, &command, &log)
        }
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
