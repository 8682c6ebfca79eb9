// External crates
use clap::Parser;
use tracing::debug;

// Internal imports
use nb_core::{nb_error, nb_error_hint};
use nb_logging::{init_subscriber, LogSettings};

// Local modules
mod cli;
mod commands;

use cli::Args;
use commands::{execute_command, hint_for, resolve, AppContext};

fn main() {
    let args = Args::parse();

    // Overrides decide verbosity, so they are resolved before logging starts
    let (config, overrides) = match resolve(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    };

    let log_guard = init_subscriber(&LogSettings::from_env(overrides.verbose));
    debug!(command = ?args.command, config = ?config.source_path, "starting nodebuild");

    let ctx = AppContext::new(config, overrides);
    if let Err(e) = execute_command(&args.command, &ctx) {
        report(&e);
        // Flush buffered file logs before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}

fn report(err: &anyhow::Error) {
    nb_error!("{:#}", err);
    if let Some(hint) = hint_for(err) {
        nb_error_hint!("{}", hint);
    }
}
