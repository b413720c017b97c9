mod cli;
mod commands;
mod config;
mod error;
mod output;
mod report;

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Debug mode in the config file turns on the log file as well
    let debug_mode = config::debug_mode(&cli.global);
    let log_file = cli
        .global
        .log_file
        .clone()
        .or_else(|| debug_mode.then(|| sitepulse_config::config_dir().join("sitepulse.log")));
    let _guard = init_tracing(cli.global.verbose, log_file.as_deref());

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Console logging on stderr, plus an optional debug-level log file.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(verbosity: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)));

    let (file_layer, guard) = match log_file.and_then(open_log_file) {
        Some((writer, guard)) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    guard
}

fn open_log_file(
    path: &Path,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?;
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("warning: cannot create log directory {}: {e}", dir.display());
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, name);
    Some(tracing_appender::non_blocking(appender))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need an authenticated session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sitepulse", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the API
        cmd => {
            let ctx = config::Context::load(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, ctx, &cli.global).await
        }
    }
}
