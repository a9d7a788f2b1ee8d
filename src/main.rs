//! `MoodHarmony` - Guided emotional transition sessions

use clap::Parser;

use moodharmony::cli::args::{Cli, OutputFormat};
use moodharmony::cli::commands;
use moodharmony::error::ExitCode;
use moodharmony::observability::{LogFormat, init_logging, init_metrics};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        let format = match cli.log_format {
            OutputFormat::Human => LogFormat::Human,
            OutputFormat::Json => LogFormat::Json,
        };
        init_logging(format, cli.verbose, cli.color);
    }

    if let Some(port) = cli.metrics_port {
        if let Err(e) = init_metrics(Some(port)) {
            eprintln!("error: {e}");
            std::process::exit(ExitCode::ERROR);
        }
    }

    // Second signal forces exit; the first is left to the running command
    tokio::spawn(async {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
                tracing::warn!("failed to register SIGTERM handler");
                return;
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
                _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            let _ = tokio::signal::ctrl_c().await;
            std::process::exit(ExitCode::INTERRUPTED);
        }
    });

    let result = commands::dispatch(cli).await;

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
