mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CliConfig;
use intentflow_core::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a run that finished with failed steps.
const EXIT_RUN_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        completions::generate_completions(shell);
        return;
    }

    let config = match &cli.config {
        Some(path) => CliConfig::load_from_path(Some(path.clone())),
        None => CliConfig::load(),
    };
    let guard = init_logging(cli.verbose);

    let result = dispatch(cli, config).await;
    // Flush the log file before any process::exit below.
    drop(guard);

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => error::handle_error(err),
    }
}

async fn dispatch(cli: Cli, config: CliConfig) -> Result<i32> {
    let format = cli.format;
    match cli.command {
        Commands::Run(args) => {
            let success = commands::run::run(args, &config, format).await?;
            Ok(if success { 0 } else { EXIT_RUN_FAILED })
        }
        Commands::Validate(args) => {
            let valid = commands::validate::run(args, format)?;
            Ok(if valid { 0 } else { 1 })
        }
        Commands::Render(args) => {
            commands::render::run(args, format)?;
            Ok(0)
        }
        Commands::Probe => {
            commands::probe::run(format).await?;
            Ok(0)
        }
        Commands::Completions { shell } => {
            completions::generate_completions(shell);
            Ok(0)
        }
    }
}

/// Log to stderr and to a daily file under the IntentFlow logs directory.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match paths::logs_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "intentflow.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_level(true);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}
