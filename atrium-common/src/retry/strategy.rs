use super::error::TooManyRetries;
use std::time::Duration;

/// Decides how long to wait before the next attempt.
pub trait RetryStrategy {
    /// Returns the next backoff duration, or [`TooManyRetries`] once the strategy is exhausted.
    fn next_backoff(&mut self) -> Result<Duration, TooManyRetries>;
}

/// A strategy whose backoff grows by `backoff` on every attempt.
///
/// The n-th call returns `n * backoff`, clipped to `max_backoff` when it is non-zero.
/// After `max_retries` calls every further call fails.
///
/// The attempt counter lives in the strategy, so create a fresh instance per retry session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearRetryStrategy {
    current_retry: u32,
    pub max_retries: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl LinearRetryStrategy {
    pub fn new(max_retries: u32, backoff: Duration, max_backoff: Duration) -> Self {
        Self { current_retry: 0, max_retries, backoff, max_backoff }
    }
    /// Number of backoffs handed out so far.
    pub fn current_retry(&self) -> u32 {
        self.current_retry
    }
}

impl Default for LinearRetryStrategy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(2), Duration::from_secs(10))
    }
}

impl RetryStrategy for LinearRetryStrategy {
    fn next_backoff(&mut self) -> Result<Duration, TooManyRetries> {
        if self.current_retry == u32::MAX || self.current_retry == self.max_retries {
            return Err(TooManyRetries);
        }
        let mut backoff = self.backoff.saturating_mul(self.current_retry + 1);
        if !self.max_backoff.is_zero() {
            backoff = backoff.min(self.max_backoff);
        }
        self.current_retry += 1;
        Ok(backoff)
    }
}
