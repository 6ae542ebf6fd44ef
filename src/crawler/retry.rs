//! Bounded retry policy
//!
//! Retries are expressed as a value that can be exercised with any async
//! operation, so the attempt/delay behavior is testable without a network.

use std::future::Future;
use std::time::Duration;

/// What an attempt decided about the operation
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// Finished; stop retrying
    Done(T),

    /// Failed in a way worth another attempt
    Retry(E),
}

/// Outcome after the policy ran its course
#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// An attempt returned `Attempt::Done`
    Completed { value: T, attempts: u32 },

    /// Every attempt asked for a retry; carries the last error
    Exhausted { last_error: E, attempts: u32 },
}

/// Fixed-delay retry policy with a maximum attempt count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it reports `Done` or attempts are exhausted
    ///
    /// The operation receives the 1-based attempt number. The delay is only
    /// slept between attempts, never after the last one.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Attempt::Done(value) => {
                    return RetryOutcome::Completed {
                        value,
                        attempts: attempt,
                    }
                }
                Attempt::Retry(error) => {
                    if attempt >= self.max_attempts {
                        return RetryOutcome::Exhausted {
                            last_error: error,
                            attempts: attempt,
                        };
                    }
                }
            }

            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}
