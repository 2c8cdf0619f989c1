use std::{fmt::Display, time::Duration};

use backon::{ConstantBuilder, Retryable};
use tracing::warn;

/// Default number of attempts per logical step (one try plus one retry).
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;

/// Default delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded retry policy for external lookups.
///
/// The wrapped operation is the unit of retry: it is re-run from the start on
/// every attempt, never resumed partway. Both knobs are plain data so tests
/// can assert against them and drive short backoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: usize,
    /// Fixed delay between consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, backoff: DEFAULT_BACKOFF }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: usize, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    /// Runs `operation` until it succeeds or `max_attempts` is exhausted,
    /// sleeping `backoff` between attempts.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let strategy = ConstantBuilder::default()
            .with_delay(self.backoff)
            .with_max_times(self.max_attempts.saturating_sub(1));

        operation
            .retry(strategy)
            .notify(|err: &E, dur: Duration| {
                warn!(error = %err, "Attempt failed, retrying after {:?}", dur);
            })
            .sleep(tokio::time::sleep)
            .await
    }
}
