use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use homefiles::cli::{self, Command};
use homefiles::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let name = args.command.name();

    // Output-only commands skip logging setup entirely.
    match &args.command {
        Command::Version => {
            commands::version::run()?;
            return Ok(());
        }
        Command::Completions(opts) => {
            commands::completions::run(opts);
            return Ok(());
        }
        _ => {}
    }

    logging::init_subscriber(args.verbose, name);
    let log = Arc::new(logging::Logger::new(name));
    let global = &args.global;

    let result = match &args.command {
        Command::Init(opts) => commands::init::run(global, opts, &log),
        Command::Clone(opts) => commands::clone::run(global, opts, &log),
        Command::Track(opts) => commands::track::run_track(global, opts, &log),
        Command::Untrack(opts) => commands::track::run_untrack(global, opts, &log),
        Command::Link(opts) => commands::link::run_link(global, opts, &log),
        Command::Unlink(opts) => commands::link::run_unlink(global, opts, &log),
        Command::Status(opts) => commands::status::run(global, opts, &log),
        Command::Sync(opts) => commands::sync::run(global, opts, &log),
        Command::Bundles => commands::bundles::run(global, &log),
        Command::Version | Command::Completions(_) => Ok(()),
    };

    if let Err(e) = &result {
        log.error(&format!("{e:#}"));
        if let Some(path) = log.log_path() {
            log.info(&format!("log: {}", path.display()));
        }
    }
    result
}
