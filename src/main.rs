//! Orders analytics pipeline.
//!
//! Offline batch pipeline turning raw, denormalized order records into a
//! normalized relational schema plus derived analytical tables:
//! - Ingest: raw Parquet batch → transient staging table
//! - Normalize: staging → deduplicated customers/products + orders
//! - Analyze: entity snapshot → six derived tables, rebuilt from scratch

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use duckdb_store::{Store, StoreConfig};
use telemetry::init_tracing_from_env;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Path of the raw Parquet batch file
    #[serde(default = "default_source_path")]
    source_path: String,

    #[serde(default)]
    store: StoreConfig,
}

fn default_source_path() -> String {
    "data.parquet".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Parser)]
#[command(name = "orders-pipeline", version, about = "Batch normalization and analytics pipeline for raw order data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stage the raw Parquet batch into the store
    Ingest,
    /// Split the staged batch into normalized entity tables
    Normalize,
    /// Rebuild the derived analytics tables from the entity tables
    Analyze,
    /// Run the full ingest → normalize → analyze sequence
    Run,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    let cli = Cli::parse();

    info!("Starting orders pipeline v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    let source = Path::new(&config.source_path);

    match cli.command {
        Command::Ingest => {
            let mut store = open_store(&config)?;
            pipeline::ingest::run(&mut store, source).context("Ingest stage failed")?;
        }
        Command::Normalize => {
            let mut store = open_store(&config)?;
            pipeline::normalize::run(&mut store).context("Normalize stage failed")?;
        }
        Command::Analyze => {
            let mut store = open_store(&config)?;
            pipeline::analytics::run(&mut store).context("Analyze stage failed")?;
        }
        Command::Run => {
            pipeline::run_all(&config.store, source).context("Pipeline run failed")?;
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Store> {
    Store::open(config.store.clone())
        .with_context(|| format!("Failed to open store at {}", config.store.path))
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ORDERS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested store config from environment
    if let Ok(path) = std::env::var("ORDERS_STORE_PATH") {
        config.store.path = path;
    }
    if let Ok(source) = std::env::var("ORDERS_SOURCE_PATH") {
        config.source_path = source;
    }

    Ok(config)
}
