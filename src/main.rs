//! Lese CLI entry point.

use anyhow::Result;
use clap::Parser;
use lese::cli::{commands, Cli, Commands};
use lese::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("lese={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(cli.config.as_deref(), &settings)?;
        }

        Commands::Index { file } => {
            commands::run_index(file, settings).await?;
        }

        Commands::Chunks { file, max_chunk_size } => {
            commands::run_chunks(file, *max_chunk_size, settings).await?;
        }

        Commands::Ask {
            file,
            question,
            model,
            top_k,
        } => {
            commands::run_ask(file, question, model.clone(), *top_k, settings).await?;
        }

        Commands::Search { file, query, top_k } => {
            commands::run_search(file, query, *top_k, settings).await?;
        }

        Commands::Chat { file, model } => {
            commands::run_chat(file, model.clone(), settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
