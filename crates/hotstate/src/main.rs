mod cli;
mod commands;
mod config;
mod error;
mod output;
mod screens;
mod services;

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity; the guard flushes file logs on exit
    let log_guard = init_tracing(cli.global.verbose, cli.global.log_file.as_deref());

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        drop(log_guard);
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return None;
    };

    let log_dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("hotstate.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Some(guard)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    commands::dispatch(cli.command, &cli.global).await
}
