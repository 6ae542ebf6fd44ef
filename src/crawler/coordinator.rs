//! Crawler coordinator - assembles and runs one crawl
//!
//! This module contains the glue between configuration and the pipeline:
//! - Rebuilding the frontier from the dataset (resume point)
//! - Building the HTTP fetcher from the `[fetcher]` section
//! - Wiring fetcher, extractor and dataset into a scheduler
//! - Running the pipeline until exhaustion or cancellation

use crate::config::Config;
use crate::crawler::extractor::{Extractor, ProfileExtractor};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::scheduler::{CrawlReport, Scheduler};
use crate::storage::JsonlDataset;
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds crawl pipelines that share one dataset and extractor
#[derive(Clone)]
pub struct Coordinator {
    config: Arc<Config>,
    dataset: JsonlDataset,
    extractor: Arc<dyn Extractor>,
}

impl Coordinator {
    /// Creates a coordinator with the default profile extractor
    ///
    /// The dataset is opened at `output.dataset-path`.
    pub fn new(config: Arc<Config>) -> Self {
        let dataset = JsonlDataset::new(config.output.dataset_path.clone());
        Self::with_parts(config, dataset, Arc::new(ProfileExtractor::new()))
    }

    /// Creates a coordinator from explicit parts
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `dataset` - Dataset that receives records and drives resumption
    /// * `extractor` - Turns fetched pages into records
    pub fn with_parts(
        config: Arc<Config>,
        dataset: JsonlDataset,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            config,
            dataset,
            extractor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> &JsonlDataset {
        &self.dataset
    }

    /// Computes the frontier the next crawl would walk
    ///
    /// Scans the dataset on a blocking thread.
    pub async fn resume_frontier(&self) -> Result<Frontier> {
        let dataset = self.dataset.clone();
        let floor = self.config.crawler.start_id;
        let ceiling = self.config.crawler.end_id;

        let frontier =
            tokio::task::spawn_blocking(move || Frontier::resume(&dataset, floor, ceiling))
                .await??;
        Ok(frontier)
    }

    /// Prepares a crawl: resume point and HTTP client
    ///
    /// # Returns
    ///
    /// * `Ok(PreparedCrawl)` - Ready to run
    /// * `Err(HarvestError)` - The dataset could not be scanned or the client
    ///   could not be built
    pub async fn prepare(&self) -> Result<PreparedCrawl> {
        let frontier = self.resume_frontier().await?;
        let fetcher = Fetcher::from_config(&self.config.fetcher)?;

        tracing::info!(
            "Prepared crawl of {} ids starting at {:?} (dataset {})",
            frontier.remaining(),
            frontier.peek(),
            self.dataset.path().display()
        );

        let scheduler = Scheduler::new(
            Arc::new(fetcher),
            Arc::clone(&self.extractor),
            self.dataset.clone(),
            self.config.crawler.max_concurrent_fetches as usize,
        );

        Ok(PreparedCrawl {
            scheduler,
            frontier,
        })
    }
}

/// A crawl whose resources are ready; only running remains
pub struct PreparedCrawl {
    scheduler: Scheduler,
    frontier: Frontier,
}

impl PreparedCrawl {
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl until the frontier is exhausted or `cancel` fires
    pub async fn run(self, cancel: CancellationToken) -> CrawlReport {
        self.scheduler.run(self.frontier, cancel).await
    }
}

/// Runs a complete crawl operation in the foreground
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Stops the crawl when cancelled
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished or was cancelled
/// * `Err(HarvestError)` - Crawl could not be started
///
/// # Example
///
/// ```no_run
/// use rating_harvester::config::load_config;
/// use rating_harvester::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(config, CancellationToken::new()).await?;
/// println!("saved {} records", report.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, cancel: CancellationToken) -> Result<CrawlReport> {
    let coordinator = Coordinator::new(Arc::new(config));
    let prepared = coordinator.prepare().await?;
    Ok(prepared.run(cancel).await)
}
