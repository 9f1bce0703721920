//! CarLog server
//!
//! Run with: cargo run
//!
//! # Configuration
//!
//! Loaded from the first of `~/.config/carlog/config.toml`,
//! `/etc/carlog/config.toml`, `./config.toml`, then overridden by:
//! - `CARLOG_DB_PATH`: SQLite database path
//! - `CARLOG_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `CARLOG_API_PORT`: Port to listen on (default: 8090)
//! - `CARLOG_LOG_LEVEL` / `CARLOG_LOG_FORMAT`: Logging overrides
//! - `RUST_LOG`: Log filter (default: carlog=info,tower_http=debug)

use anyhow::Context;
use carlog::api::{serve, ApiConfig, AppState};
use carlog::config::{generate_default_config, Config};
use carlog::stats::{StatsEngine, StatsFeed};
use carlog::store::RecordStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Personal vehicle fuel logbook server
#[derive(Debug, Parser)]
#[command(name = "carlog", version, about)]
struct Cli {
    /// Path to a config file (overrides the default search path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default config file to stdout and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    init_tracing(&config);

    tracing::info!("Starting CarLog v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.store.db_path);

    // Open the record store
    let store = Arc::new(
        RecordStore::open(&config.store.db_path)
            .with_context(|| format!("opening record store at {}", config.store.db_path))?,
    );
    let engine = Arc::new(StatsEngine::new(Arc::clone(&store)));

    // Keep the read model refreshed after every write
    let feed = StatsFeed::spawn(Arc::clone(&store), Arc::clone(&engine));

    // Run server
    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        cors_origins: config.api.cors_origins.clone(),
    };
    let state = AppState::new(Arc::clone(&store), engine, api_config.clone());

    serve(state, &api_config).await?;

    feed.abort();
    tracing::info!("CarLog stopped");
    Ok(())
}

/// Initialize tracing with the configured level and format
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "carlog={},tower_http=debug",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
