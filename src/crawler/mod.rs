//! Crawler module for profile fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Profile extraction from HTML
//! - The resumable identifier frontier
//! - Bounded-concurrency scheduling of fetch tasks
//! - Overall crawl coordination
//! - Probing for the latest existing identifier

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod probe;
mod retry;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, PreparedCrawl};
pub use extractor::{clean_display_text, Extractor, ProfileExtractor};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher};
pub use frontier::{resume_point, Frontier};
pub use probe::{find_latest_id, profile_exists, ProbeBounds};
pub use retry::{Attempt, RetryOutcome, RetryPolicy};
pub use scheduler::{CrawlReport, Scheduler};
