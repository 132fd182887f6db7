//! Callpilot CLI entry point.

use anyhow::Result;
use callpilot::cli::{commands, Cli, Commands};
use callpilot::config::Settings;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("callpilot={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Ingest { dir } => commands::run_ingest(dir.clone(), settings).await,

        Commands::List => commands::run_list(settings).await,

        Commands::Ask {
            question,
            k,
            filters,
        } => commands::run_ask(question, *k, filters, settings).await,

        Commands::Summarize { call_id, last, k } => {
            commands::run_summarize(call_id.clone(), *last, *k, settings).await
        }

        Commands::Search {
            query,
            k,
            filters,
            where_json,
        } => commands::run_search(query, *k, filters, where_json.as_deref(), settings).await,

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)
        }
    }
}
