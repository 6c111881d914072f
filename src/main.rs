//! Listing-Sync main entry point
//!
//! This is the command-line interface for the listing catalog synchronizer.

use clap::Parser;
use listing_sync::config::{load_config_with_hash, Config};
use listing_sync::output::{load_statistics, print_statistics, LogReportSink, SqliteReportSink};
use listing_sync::source::{HttpEnumerator, ListingEnumerator};
use listing_sync::storage::open_storage;
use listing_sync::sync::{share, shutdown_channel, wait_for_signal, Coordinator, Scheduler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Listing-Sync: keeps a job catalog in step with live job-board listings
///
/// Every cycle enumerates the listings of each configured source, scrapes and
/// extracts the ones that are new or stale, and removes records whose listing
/// has closed.
#[derive(Parser, Debug)]
#[command(name = "listing-sync")]
#[command(version = "1.0.0")]
#[command(about = "Job listing ingestion and sync", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "ingest_url"])]
    once: bool,

    /// Validate config and enumerate sources without scraping or writing
    #[arg(long, conflicts_with_all = ["once", "stats", "ingest_url"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run", "ingest_url"])]
    stats: bool,

    /// Scrape, extract and store a single listing URL, then exit
    #[arg(long, value_name = "URL")]
    ingest_url: Option<String>,

    /// Company to record when the page and extractor name none (with --ingest-url)
    #[arg(long, requires = "ingest_url")]
    company: Option<String>,

    /// Source the ingested listing belongs to (defaults to the first configured source)
    #[arg(long, value_name = "ID", requires = "ingest_url")]
    source: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config).await?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(url) = &cli.ingest_url {
        handle_ingest(&config, url, cli.source.as_deref(), cli.company.as_deref()).await?;
    } else {
        handle_sync(config, config_hash, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_sync=info,warn"),
            1 => EnvFilter::new("listing_sync=debug,info"),
            2 => EnvFilter::new("listing_sync=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and enumerates every active source
async fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Listing-Sync Dry Run ===\n");

    println!("Scheduler:");
    println!("  Interval: {}s", config.scheduler.interval_secs);
    println!("  Freshness window: {}h", config.scheduler.freshness_hours);
    println!("  Max concurrent scrapes: {}", config.scheduler.max_concurrent_scrapes);

    println!("\nScraper:");
    println!("  Allowed hosts: {}", config.scraper.allowed_hosts.join(", "));
    println!("  Minimum content length: {}", config.scraper.min_content_length);
    println!(
        "  Headless fallback: {}",
        if config.scraper.headless { "enabled" } else { "disabled" }
    );

    println!("\nExtractor:");
    println!("  Model: {} at {}", config.extractor.model, config.extractor.base_url);
    let key_present = std::env::var(&config.extractor.api_key_env).is_ok();
    println!(
        "  API key (${}): {}",
        config.extractor.api_key_env,
        if key_present { "set" } else { "missing" }
    );

    println!("\nDatabase: {}", config.storage.database_path);

    let enumerator = HttpEnumerator::new(&config.enumerator, &config.scraper.user_agent)?;
    let sources = config.active_sources();
    println!("\nActive Sources ({}):", sources.len());
    for source in &sources {
        let result = enumerator.enumerate(source).await;
        println!(
            "  - {} ({}): {} listings over {} pages, stopped: {:?}",
            source.id,
            source.platform.to_db_string(),
            result.urls.len(),
            result.pages_fetched,
            result.stop
        );
        if let Some(warning) = &result.warning {
            println!("    ! {}", warning);
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage, 10)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --ingest-url mode: one listing through the full upsert path
async fn handle_ingest(
    config: &Config,
    url: &str,
    source_id: Option<&str>,
    company: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = match source_id {
        Some(id) => config.find_source(id),
        None => config.sources.first().map(|entry| entry.to_source()),
    }
    .ok_or_else(|| listing_sync::SyncError::UnknownSource(source_id.unwrap_or("<none>").to_string()))?;

    let storage = share(open_storage(Path::new(&config.storage.database_path))?);
    let coordinator = Coordinator::from_config(config, storage)?;

    match coordinator.ingest(&source, url, company).await {
        Ok(result) => {
            println!(
                "{}: {} at {} ({})",
                result.outcome, result.job.title, result.job.company, result.job.source_url
            );
            Ok(())
        }
        Err(e) if e.is_user_facing() => {
            eprintln!("{}", e);
            Err(e.into())
        }
        Err(e) => {
            tracing::error!("Ingest of {} failed: {}", url, e);
            Err(e.into())
        }
    }
}

/// Handles the sync loop (or a single cycle with --once)
async fn handle_sync(
    config: Config,
    config_hash: String,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sources = config.active_sources();
    if sources.is_empty() {
        tracing::warn!("No active sources configured; cycles will do nothing");
    }
    tracing::info!(
        "Sources: {}",
        sources.iter().map(|s| s.id.as_str()).collect::<Vec<_>>().join(", ")
    );

    let storage = share(open_storage(Path::new(&config.storage.database_path))?);
    let coordinator = Coordinator::from_config(&config, storage.clone())?;

    let scheduler = Scheduler::new(
        coordinator,
        Duration::from_secs(config.scheduler.interval_secs),
        config.scheduler.run_on_start,
    )
    .with_sink(Arc::new(LogReportSink))
    .with_sink(Arc::new(SqliteReportSink::new(storage, config_hash)));

    if once {
        match scheduler.run_once().await {
            Ok(_) => {
                tracing::info!("Sync cycle completed successfully");
                return Ok(());
            }
            Err(e) => {
                tracing::error!("Sync cycle failed: {}", e);
                return Err(e.into());
            }
        }
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(wait_for_signal(shutdown_tx));
    scheduler.run(shutdown_rx).await;

    Ok(())
}
