use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsrelay_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "newsrelay")]
#[command(author, version, about = "Relay new team news articles to a chat channel, each exactly once")]
struct Cli {
    /// Config file (default: ~/.config/newsrelay/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one poll cycle now (for cron)
    Run,
    /// Poll on the configured interval until Ctrl+C
    Daemon,
    /// Show what the next cycle would send, without sending
    Preview,
    /// Show the stored cursor
    Status,
    /// Delete the stored cursor; the next cycle starts without a backlog
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging; RUST_LOG wins over the config file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run => commands::run::run(&config).await,
        Commands::Daemon => commands::daemon::run(&config).await,
        Commands::Preview => commands::preview::run(&config).await,
        Commands::Status => commands::status::run(&config).await,
        Commands::Reset => commands::reset::run(&config).await,
    }
}
