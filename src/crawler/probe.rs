//! Latest-identifier probe
//!
//! Finds the highest identifier that currently has a profile, assuming
//! profiles are dense below it: first doubles an upper bound while profiles
//! keep existing, then binary searches between the last hit and the bound.

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{FetchOutcome, Fetcher};

/// Bounds for a probe run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeBounds {
    /// Identifier assumed to exist; the result is never below it
    pub from: u64,

    /// First upper bound to test
    pub initial_upper: u64,

    /// The upper bound is never grown past this
    pub cap: u64,
}

impl ProbeBounds {
    /// Bounds that start doubling from `2 * from`
    pub fn doubling_from(from: u64, cap: u64) -> Self {
        Self {
            from,
            initial_upper: from.saturating_mul(2).min(cap),
            cap,
        }
    }
}

/// Whether an identifier has a profile
///
/// Any fetch failure counts as absent, as does a page without identity
/// fields.
pub async fn profile_exists(
    fetcher: &Fetcher,
    extractor: &dyn Extractor,
    professor_id: u64,
) -> bool {
    match fetcher.fetch(professor_id).await {
        FetchOutcome::Page(html) => extractor.extract(professor_id, &html).is_some(),
        FetchOutcome::NotFound | FetchOutcome::Failed { .. } => false,
    }
}

/// Finds the highest existing identifier within `bounds`
///
/// # Arguments
///
/// * `fetcher` - Fetches candidate pages
/// * `extractor` - Decides whether a page is a profile
/// * `bounds` - Starting point, first upper bound and cap
///
/// # Returns
///
/// The highest identifier found to exist, or `bounds.from` when nothing
/// above it does.
pub async fn find_latest_id(
    fetcher: &Fetcher,
    extractor: &dyn Extractor,
    bounds: ProbeBounds,
) -> u64 {
    let mut low = bounds.from;
    let mut high = bounds.initial_upper.max(bounds.from);

    while high < bounds.cap && profile_exists(fetcher, extractor, high).await {
        tracing::info!("Professor {} exists, increasing upper bound", high);
        low = high;
        high = high.saturating_mul(2);
        if high > bounds.cap {
            tracing::info!("Upper bound capped at {}", bounds.cap);
            high = bounds.cap;
        }
    }

    tracing::info!("Binary search between {} and {}", low, high);

    let mut result = low;
    while low <= high {
        let mid = low + (high - low) / 2;
        if profile_exists(fetcher, extractor, mid).await {
            result = mid;
            match mid.checked_add(1) {
                Some(next) => low = next,
                None => break,
            }
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    tracing::info!("Highest valid professor ID: {}", result);
    result
}
