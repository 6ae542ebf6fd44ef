//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building an HTTP client that presents browser-like headers
//! - Resolving an identifier to its profile URL
//! - Retry logic for transient failures
//! - Classifying responses into page / not found / failed

use crate::config::FetcherConfig;
use crate::crawler::retry::{Attempt, RetryOutcome, RetryPolicy};
use crate::HarvestError;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Result of fetching one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was served; carries the body
    Page(String),

    /// The site answered 404 for this identifier
    NotFound,

    /// Every attempt failed; the identifier's existence is unknown
    Failed {
        /// Description of the last failure
        error: String,
        /// Number of attempts made
        attempts: u32,
    },
}

/// Builds an HTTP client that looks like a desktop browser
///
/// Compression is negotiated by the client itself (gzip, brotli), so no
/// `Accept-Encoding` header is set here.
///
/// # Arguments
///
/// * `timeout` - Timeout applied to every single attempt
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches profile pages by identifier with bounded retries
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from parts
    ///
    /// `base_url` should end with `/` so identifiers are appended as a new
    /// path segment.
    pub fn new(client: Client, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url,
            policy,
        }
    }

    /// Creates a fetcher from the `[fetcher]` configuration section
    pub fn from_config(config: &FetcherConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config.timeout())?;
        let base_url = Url::parse(&config.base_url)?;
        let policy = RetryPolicy::new(config.max_attempts, config.retry_delay());
        Ok(Self::new(client, base_url, policy))
    }

    /// The profile URL for an identifier
    pub fn profile_url(&self, professor_id: u64) -> Result<Url, url::ParseError> {
        self.base_url.join(&professor_id.to_string())
    }

    /// Fetches the profile page for one identifier
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Immediate → Page |
    /// | HTTP 404 | Immediate → NotFound |
    /// | Other status | Retry, fixed delay |
    /// | Timeout / connection / body error | Retry, fixed delay |
    /// | Attempts exhausted | Failed |
    ///
    /// Never returns an error; every failure is folded into the outcome.
    pub async fn fetch(&self, professor_id: u64) -> FetchOutcome {
        let url = match self.profile_url(professor_id) {
            Ok(url) => url,
            Err(e) => {
                return FetchOutcome::Failed {
                    error: e.to_string(),
                    attempts: 0,
                }
            }
        };

        let client = &self.client;
        let outcome = self
            .policy
            .run(|attempt| {
                let url = url.clone();
                async move {
                    let result = fetch_once(client, url).await;
                    if let Attempt::Retry(error) = &result {
                        tracing::debug!(
                            "Error for professor {} (attempt {}): {}",
                            professor_id,
                            attempt,
                            error
                        );
                    }
                    result
                }
            })
            .await;

        match outcome {
            RetryOutcome::Completed {
                value: Some(body), ..
            } => FetchOutcome::Page(body),
            RetryOutcome::Completed { value: None, .. } => FetchOutcome::NotFound,
            RetryOutcome::Exhausted {
                last_error,
                attempts,
            } => {
                tracing::warn!(
                    "Giving up on professor {} after {} attempts: {}",
                    professor_id,
                    attempts,
                    last_error
                );
                FetchOutcome::Failed {
                    error: last_error,
                    attempts,
                }
            }
        }
    }
}

/// Performs a single GET and classifies the response
///
/// `Done(Some(body))` for a page, `Done(None)` for a 404, `Retry` otherwise.
async fn fetch_once(client: &Client, url: Url) -> Attempt<Option<String>, String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return Attempt::Retry(classify_transport_error(&e)),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Attempt::Done(None);
    }

    if !status.is_success() {
        return Attempt::Retry(format!("HTTP {}", status.as_u16()));
    }

    match response.text().await {
        Ok(body) => Attempt::Done(Some(body)),
        Err(e) => Attempt::Retry(format!("Failed to read body: {}", e)),
    }
}

fn classify_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
