//! Rating-Harvester main entry point
//!
//! This is the command-line interface for the Rating-Harvester crawler.

use anyhow::{Context, Result};
use clap::Parser;
use rating_harvester::config::{load_config_with_hash, Config};
use rating_harvester::control::{self, ApiState, JobController};
use rating_harvester::crawler::{
    find_latest_id, run_crawl, Coordinator, Fetcher, ProbeBounds, ProfileExtractor,
};
use rating_harvester::storage::JsonlDataset;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Rating-Harvester: a resumable professor-profile crawler
///
/// Rating-Harvester walks numerically indexed profile pages, extracts one
/// record per existing profile and appends it to a JSON Lines dataset. By
/// default it serves an HTTP API for starting, pausing and inspecting the
/// crawl.
#[derive(Parser, Debug)]
#[command(name = "rating-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resumable professor-profile crawler", long_about = None)]
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

    /// Run one crawl in the foreground instead of serving the control API
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "find_latest"])]
    once: bool,

    /// Validate config and show where the next crawl would resume
    #[arg(long, conflicts_with_all = ["once", "stats", "find_latest"])]
    dry_run: bool,

    /// Show statistics from the dataset and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run", "find_latest"])]
    stats: bool,

    /// Probe for the highest existing professor id, starting from an id known to exist
    #[arg(long, value_name = "FROM", conflicts_with_all = ["once", "dry_run", "stats"])]
    find_latest: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => (cfg, hash),
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(config).await
    } else if cli.stats {
        handle_stats(&config).await
    } else if let Some(from) = cli.find_latest {
        handle_find_latest(&config, from).await
    } else if cli.once {
        handle_once(config).await
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rating_harvester=info,warn"),
            1 => EnvFilter::new("rating_harvester=debug,info"),
            2 => EnvFilter::new("rating_harvester=trace,debug"),
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

/// Cancels `cancel` on the first Ctrl-C
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, stopping");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

/// Handles the --dry-run mode: shows configuration and the resume point
async fn handle_dry_run(config: Config) -> Result<()> {
    println!("=== Rating-Harvester Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Id range: {}..{}",
        config.crawler.start_id, config.crawler.end_id
    );

    println!("\nFetcher:");
    println!("  Base URL: {}", config.fetcher.base_url);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!(
        "  Attempts: {} ({}ms apart)",
        config.fetcher.max_attempts, config.fetcher.retry_delay_ms
    );

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.dataset_path.display());

    println!("\nServer:");
    println!("  Bind: {}", config.server.bind);

    let coordinator = Coordinator::new(Arc::new(config));
    let frontier = coordinator
        .resume_frontier()
        .await
        .context("failed to scan dataset")?;

    println!("\n✓ Configuration is valid");
    match frontier.peek() {
        Some(next) => println!(
            "✓ Would resume at professor {} ({} ids left)",
            next,
            frontier.remaining()
        ),
        None => println!("✓ Nothing left to crawl below {}", frontier.ceiling()),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the dataset
async fn handle_stats(config: &Config) -> Result<()> {
    let dataset = JsonlDataset::new(config.output.dataset_path.clone());
    println!("Dataset: {}\n", dataset.path().display());

    let (records, max_id) = tokio::task::spawn_blocking(move || {
        Ok::<_, std::io::Error>((dataset.count_records()?, dataset.max_professor_id()?))
    })
    .await?
    .context("failed to read dataset")?;

    println!("Records: {}", records);
    match max_id {
        Some(id) => println!("Highest professor id: {}", id),
        None => println!("Highest professor id: none"),
    }

    Ok(())
}

/// Handles the --find-latest mode: probes for the highest existing id
async fn handle_find_latest(config: &Config, from: u64) -> Result<()> {
    let fetcher = Fetcher::from_config(&config.fetcher)?;
    let bounds = ProbeBounds::doubling_from(from, config.crawler.end_id);
    tracing::info!(
        "Probing from {} (first upper bound {}, cap {})",
        bounds.from,
        bounds.initial_upper,
        bounds.cap
    );

    let latest = find_latest_id(&fetcher, &ProfileExtractor::new(), bounds).await;
    println!("Highest valid professor ID: {}", latest);

    Ok(())
}

/// Handles the --once mode: runs a crawl in the foreground
async fn handle_once(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match run_crawl(config, cancel).await {
        Ok(report) if report.cancelled => {
            tracing::info!("Crawl paused; the next run resumes above the dataset's highest id");
            Ok(())
        }
        Ok(_) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the default mode: serves the control API until Ctrl-C
async fn handle_serve(config: Config) -> Result<()> {
    let bind = config.server.bind.clone();
    let controller = Arc::new(JobController::new(Coordinator::new(Arc::new(config))));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    control::serve(
        listener,
        ApiState::new(Arc::clone(&controller)),
        shutdown.cancelled_owned(),
    )
    .await
    .context("control API failed")?;

    // Stop any running crawl before exit
    controller.pause().await;
    tracing::info!("Shut down");

    Ok(())
}
