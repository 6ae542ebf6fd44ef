//! Worker pool for the crawl pipeline
//!
//! This module handles:
//! - Dispatching frontier identifiers to fetch tasks
//! - Bounding the number of in-flight identifiers via a semaphore
//! - Collecting task results in completion order
//! - Handing extracted records to the dataset writer
//! - Stopping promptly on cancellation

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{FetchOutcome, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::record::ProfessorRecord;
use crate::storage::JsonlDataset;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Completions between progress log lines
const PROGRESS_INTERVAL: u64 = 1000;

/// What happened to one identifier
#[derive(Debug)]
enum ProfileResult {
    /// Page fetched and extracted
    Record(ProfessorRecord),

    /// Page fetched but it carried no identity fields
    Miss,

    /// Site answered 404
    NotFound,

    /// Fetch failed after all attempts
    Failed(String),
}

/// Counters describing one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Identifiers dispatched to fetch tasks
    pub attempted: u64,

    /// Records appended to the dataset
    pub saved: u64,

    /// Pages without identity fields
    pub misses: u64,

    /// Identifiers answered with 404
    pub not_found: u64,

    /// Identifiers dropped after exhausting retries
    pub failures: u64,

    /// Records lost to dataset write errors
    pub write_errors: u64,

    /// Highest identifier handed to a fetch task
    pub last_dispatched: Option<u64>,

    /// Whether the run ended because of cancellation
    pub cancelled: bool,
}

impl CrawlReport {
    /// Identifiers whose task finished (including dropped ones)
    pub fn completed(&self) -> u64 {
        self.saved + self.misses + self.not_found + self.failures + self.write_errors
    }
}

/// Bounded-concurrency fetch → extract → persist pipeline
///
/// The scheduler owns no state between runs; every call to `run` gets a
/// fresh semaphore and task set.
pub struct Scheduler {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn Extractor>,
    dataset: JsonlDataset,
    max_in_flight: usize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetches pages by identifier
    /// * `extractor` - Turns pages into records
    /// * `dataset` - Receives extracted records
    /// * `max_in_flight` - Maximum identifiers fetched at the same time
    pub fn new(
        fetcher: Arc<Fetcher>,
        extractor: Arc<dyn Extractor>,
        dataset: JsonlDataset,
        max_in_flight: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            dataset,
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Runs the frontier through the pipeline until it is exhausted or
    /// `cancel` fires
    ///
    /// On cancellation no further identifiers are dispatched, tasks that have
    /// already finished are still recorded and the rest are aborted; this
    /// returns only after every task has stopped, so the dataset is not
    /// written to afterwards.
    pub async fn run(&self, mut frontier: Frontier, cancel: CancellationToken) -> CrawlReport {
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<(u64, ProfileResult)> = JoinSet::new();
        let mut report = CrawlReport::default();
        let mut exhausted = false;
        let started = Instant::now();

        tracing::info!(
            "Crawl starting at professor {:?} with {} fetches in flight",
            frontier.peek(),
            self.max_in_flight
        );

        loop {
            if exhausted && tasks.is_empty() {
                tracing::info!("Frontier exhausted, crawl complete");
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.handle_completion(joined, &mut report).await;

                    let completed = report.completed();
                    if completed % PROGRESS_INTERVAL == 0 {
                        let rate = completed as f64 / started.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} completed, {} saved, {} in flight, {:.2} ids/sec",
                            completed,
                            report.saved,
                            tasks.len(),
                            rate
                        );
                    }
                }

                permit = permits.clone().acquire_owned(), if !exhausted => {
                    let Ok(permit) = permit else {
                        break;
                    };
                    match frontier.next() {
                        Some(professor_id) => {
                            self.dispatch(&mut tasks, professor_id, permit);
                            report.attempted += 1;
                            report.last_dispatched = Some(professor_id);
                        }
                        None => exhausted = true,
                    }
                }
            }
        }

        // Finished but not yet joined tasks still count
        while let Some(joined) = tasks.try_join_next() {
            self.handle_completion(joined, &mut report).await;
        }

        if !tasks.is_empty() {
            tracing::info!("Abandoning {} in-flight fetches", tasks.len());
        }
        tasks.shutdown().await;

        tracing::info!(
            "Crawl stopped after {:?}: {} attempted, {} saved, {} misses, {} not found, {} failed, {} write errors",
            started.elapsed(),
            report.attempted,
            report.saved,
            report.misses,
            report.not_found,
            report.failures,
            report.write_errors
        );

        report
    }

    /// Spawns the fetch → extract task for one identifier
    ///
    /// The permit is held until the task finishes.
    fn dispatch(
        &self,
        tasks: &mut JoinSet<(u64, ProfileResult)>,
        professor_id: u64,
        permit: OwnedSemaphorePermit,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let extractor = Arc::clone(&self.extractor);

        tasks.spawn(async move {
            let _permit = permit;
            let result = match fetcher.fetch(professor_id).await {
                FetchOutcome::Page(html) => match extractor.extract(professor_id, &html) {
                    Some(record) => ProfileResult::Record(record),
                    None => ProfileResult::Miss,
                },
                FetchOutcome::NotFound => ProfileResult::NotFound,
                FetchOutcome::Failed { error, .. } => ProfileResult::Failed(error),
            };
            (professor_id, result)
        });
    }

    /// Records the outcome of one finished task, persisting records
    async fn handle_completion(
        &self,
        joined: Result<(u64, ProfileResult), JoinError>,
        report: &mut CrawlReport,
    ) {
        let (professor_id, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
                report.failures += 1;
                return;
            }
        };

        match result {
            ProfileResult::Record(record) => match self.dataset.append(&record).await {
                Ok(()) => {
                    tracing::info!("Saved professor {}", professor_id);
                    report.saved += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Error writing professor {} to {}: {}",
                        professor_id,
                        self.dataset.path().display(),
                        e
                    );
                    report.write_errors += 1;
                }
            },
            ProfileResult::Miss => {
                tracing::debug!("Professor {} has no profile data", professor_id);
                report.misses += 1;
            }
            ProfileResult::NotFound => {
                tracing::debug!("Professor {} not found", professor_id);
                report.not_found += 1;
            }
            ProfileResult::Failed(error) => {
                tracing::debug!("Dropping professor {}: {}", professor_id, error);
                report.failures += 1;
            }
        }
    }
}
