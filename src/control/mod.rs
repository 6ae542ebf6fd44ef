//! Job control and the HTTP control API
//!
//! This module handles:
//! - The single crawl job slot (start, pause, status)
//! - Serving the control and dataset-inspection routes over HTTP

mod api;
mod job;

pub use api::{router, serve, ApiState};
pub use job::{JobController, JobStatus, PauseOutcome, StartOutcome};
