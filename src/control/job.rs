use crate::crawler::{Coordinator, CrawlReport};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new crawl job was launched
    Started,

    /// A job was already running; nothing changed
    AlreadyRunning,
}

/// Result of a pause request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// The running job was stopped
    Paused,

    /// No job was running; nothing changed
    NotRunning,
}

/// Snapshot of the job slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub running: bool,
}

struct ActiveJob {
    cancel: CancellationToken,
    handle: JoinHandle<CrawlReport>,
    started_at: DateTime<Utc>,
}

impl ActiveJob {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Waits for the pipeline task and logs how it ended
    async fn reap(self) {
        match self.handle.await {
            Ok(report) => {
                let ran_for = Utc::now().signed_duration_since(self.started_at);
                tracing::info!(
                    "Crawl job started at {} ran for {}s: {} attempted, {} saved, {} failed{}",
                    self.started_at.to_rfc3339(),
                    ran_for.num_seconds(),
                    report.attempted,
                    report.saved,
                    report.failures,
                    match report.last_dispatched {
                        Some(id) => format!(", last id {}", id),
                        None => String::new(),
                    }
                );
            }
            Err(e) => tracing::error!("Crawl job ended abnormally: {}", e),
        }
    }
}

/// Owns the single crawl job slot
///
/// Every transition holds the slot's lock from check to completion, so
/// concurrent `start` calls launch at most one pipeline and `pause` returns
/// only once the pipeline has stopped writing.
pub struct JobController {
    coordinator: Coordinator,
    slot: Mutex<Option<ActiveJob>>,
}

impl JobController {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            slot: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Launches a crawl job unless one is already running
    ///
    /// A job that finished on its own is reaped first.
    ///
    /// # Returns
    ///
    /// * `Ok(StartOutcome)` - Whether a job was launched
    /// * `Err(HarvestError)` - The pipeline could not be prepared
    pub async fn start(&self) -> Result<StartOutcome> {
        let mut slot = self.slot.lock().await;

        if slot.as_ref().is_some_and(ActiveJob::is_running) {
            tracing::debug!("Start requested while a crawl job is running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        if let Some(finished) = slot.take() {
            finished.reap().await;
        }

        let prepared = self.coordinator.prepare().await?;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(prepared.run(cancel.clone()));

        *slot = Some(ActiveJob {
            cancel,
            handle,
            started_at: Utc::now(),
        });

        tracing::info!("Crawl job started");
        Ok(StartOutcome::Started)
    }

    /// Stops the running job and waits for it to wind down
    pub async fn pause(&self) -> PauseOutcome {
        let mut slot = self.slot.lock().await;

        match slot.take() {
            Some(job) if job.is_running() => {
                tracing::info!("Pausing crawl job");
                job.cancel.cancel();
                job.reap().await;
                PauseOutcome::Paused
            }
            Some(finished) => {
                finished.reap().await;
                PauseOutcome::NotRunning
            }
            None => PauseOutcome::NotRunning,
        }
    }

    pub async fn status(&self) -> JobStatus {
        let slot = self.slot.lock().await;
        JobStatus {
            running: slot.as_ref().is_some_and(ActiveJob::is_running),
        }
    }
}
