//! cable-harvester CLI
//!
//! Local execution entry point for the harvester.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cable_harvester::{
    error::Result,
    models::Config,
    pipeline,
    services::{RandomReader, RedditClient},
    storage::{LocalStorage, RecordStorage},
};

/// cable-harvester - Interdimensional cable video harvester
#[derive(Parser, Debug)]
#[command(
    name = "cable-harvester",
    version,
    about = "Harvests video links from a subreddit and serves random picks"
)]

struct Cli {
    /// Path to storage directory containing config and store files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the harvester until interrupted (Ctrl-C)
    Run,

    /// Run a single ingestion cycle and exit
    Harvest,

    /// Print one random stored record as JSON
    Random,

    /// Validate configuration and the store file
    Validate,

    /// Show store info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wait for Ctrl-C.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configurations
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let mut config = Config::load(&config_path)?;
    config.apply_env_overrides();
    config.validate()?;

    log::debug!("Loaded configuration from {}", config_path.display());

    let store_path = config.store_path(&cli.storage_dir);
    let storage = Arc::new(LocalStorage::new(&store_path));

    match cli.command {
        Command::Run => {
            config.require_credentials()?;
            let feed = Arc::new(RedditClient::new(config.feed.clone())?);
            pipeline::run_service(&config, feed, storage, ctrl_c()).await?;
        }

        Command::Harvest => {
            config.require_credentials()?;
            let feed = Arc::new(RedditClient::new(config.feed.clone())?);
            let report = pipeline::run_once(&config, feed, storage).await?;

            if let Some(e) = report.persist_error {
                log::error!("Store was not saved: {}", e);
            }
        }

        Command::Random => {
            let store = pipeline::open_store(storage.as_ref()).await?;
            let outcome = RandomReader::new(store).pick();
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!(
                "✓ Config OK (r/{}, {} media patterns)",
                config.feed.collection,
                config.ingest.media_patterns.len()
            );

            if let Err(e) = config.require_credentials() {
                log::warn!("{}", e);
            }

            let loaded = storage.load().await?;
            log::info!(
                "✓ Store OK ({} records, {} quarantined)",
                loaded.store.len(),
                loaded.quarantined.len()
            );

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!("Store file: {}", storage.location());

            let loaded = storage.load().await?;
            if !loaded.existed {
                log::info!("No store file found yet.");
                return Ok(());
            }

            let store = &loaded.store;
            log::info!("Records: {} (cull above {})", store.len(), config.store.max_records);
            if let Some(oldest) = store.oldest() {
                log::info!("Oldest: {} '{}' added {}", oldest.key, oldest.title, oldest.added_at);
            }
            if let Some(newest) = store.newest() {
                log::info!("Newest: {} '{}' added {}", newest.key, newest.title, newest.added_at);
            }
            for entry in &loaded.quarantined {
                log::warn!("Quarantined '{}': {}", entry.key, entry.reason);
            }
        }
    }

    Ok(())
}
