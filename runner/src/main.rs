mod commands;
mod config;
mod executors;
mod progress;
mod resume;
mod template;

use clap::Parser;
use std::{io, process::ExitCode};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

/// Use `RUST_LOG` to override the default `info` filter. Logs go to stderr so results
/// printed on stdout stay machine readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    match commands::run(commands::Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "{e}");

            ExitCode::FAILURE
        }
    }
}
