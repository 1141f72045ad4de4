//! Archive-Hasher main entry point
//!
//! This is the command-line interface for the Archive-Hasher collection crawler.

use archive_hasher::config::{load_config_with_hash, validate, Config};
use archive_hasher::crawler::run_crawl;
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Archive-Hasher: a resumable content-hash harvester
///
/// Archive-Hasher walks nested archive collections page by page, queues
/// every sub-collection it finds in a durable work ledger, and records the
/// SHA-1 digest of every file in every leaf item. An interrupted run picks
/// up where it left off.
#[derive(Parser, Debug)]
#[command(name = "archive-hasher")]
#[command(version)]
#[command(about = "A resumable content-hash harvester for archive collections", long_about = None)]
struct Cli {
    /// Collections to queue before crawling
    #[arg(value_name = "COLLECTION")]
    collections: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the work ledger database path
    #[arg(long, value_name = "PATH")]
    ledger: Option<String>,

    /// Override the hash database path
    #[arg(long, value_name = "PATH")]
    hashes: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the databases and exit
    #[arg(long, conflicts_with = "collections")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &cli.collections).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("archive_hasher=info,warn"),
            1 => EnvFilter::new("archive_hasher=debug,info"),
            2 => EnvFilter::new("archive_hasher=trace,debug"),
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

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(ledger) = &cli.ledger {
        config.output.ledger_path = ledger.clone();
    }
    if let Some(hashes) = &cli.hashes {
        config.output.hashes_path = hashes.clone();
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --stats mode: shows statistics from both databases
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use archive_hasher::output::{load_statistics, print_statistics};
    use archive_hasher::storage::{SqliteHashStore, SqliteLedger};
    use std::path::Path;

    println!("Ledger: {}", config.output.ledger_path);
    println!("Hashes: {}\n", config.output.hashes_path);

    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path))?;
    let recorder = SqliteHashStore::new(Path::new(&config.output.hashes_path))?;

    let stats = load_statistics(&ledger, &recorder)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    collections: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Batch size: {}, item delay: {}ms, retry next page: {}",
        config.crawler.batch_size,
        config.crawler.item_delay_ms,
        config.crawler.retry_next_page
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if watch_interrupts(stop, tokio::signal::ctrl_c).await {
                std::process::exit(130);
            }
        });
    }

    match run_crawl(config, collections, &stop).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl finished: {} pages, {} items recorded",
                summary.pages_processed,
                summary.items_recorded
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets `stop` on the first interrupt and returns true on the second
///
/// Returns false if the interrupt handler cannot be installed.
async fn watch_interrupts<F, Fut>(stop: Arc<AtomicBool>, mut interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    tracing::info!("Interrupt received, finishing the current page (Ctrl-C again to abort)");
    stop.store(true, Ordering::Release);

    if interrupt().await.is_err() {
        return false;
    }
    tracing::warn!("Second interrupt received, aborting mid-page");
    true
}
