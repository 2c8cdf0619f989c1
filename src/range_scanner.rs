use std::ops::RangeInclusive;

use alloy::{primitives::ChainId, transports::TransportError};
use tracing::{debug, info};

use crate::{
    error::AuditError, event::RawEvent, filter::EventFilter, limits::ProviderLimits,
};

/// A queryable source of distributor events.
///
/// The two methods mirror the two provider capabilities the scanner needs:
/// chain identity (to select the span limit) and a filtered point query over
/// one inclusive block range. Implementations must never return more results
/// than the provider's global cap for a window sized by
/// [`ProviderLimits::effective_window`]; the scanner guarantees it never
/// requests a wider one.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Chain identity of the underlying provider.
    async fn chain_id(&self) -> Result<ChainId, TransportError>;

    /// One filtered query over `range` (both ends inclusive).
    async fn query_logs(
        &self,
        range: RangeInclusive<u64>,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, TransportError>;
}

/// Chunked historical event retrieval.
///
/// Partitions an arbitrarily large block range into provider-safe windows and
/// concatenates the per-window query results. The output carries no ordering
/// guarantee; windows are nevertheless fetched sequentially in increasing
/// block order, which keeps the request pattern friendly to rate limiting and
/// leaves room for a driver-level backoff between windows.
#[derive(Debug, Clone, Default)]
pub struct RangeScanner {
    limits: ProviderLimits,
}

impl RangeScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the provider limit table.
    #[must_use]
    pub fn limits(mut self, limits: ProviderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Fetches every matching event in `[start_block, end_block]`.
    ///
    /// `events_per_block` is an a-priori density estimate (it cannot be
    /// measured without the scan itself); it may be fractional and only needs
    /// to be an upper bound for the windowing to stay under the provider's
    /// result cap.
    ///
    /// # Errors
    ///
    /// * [`AuditError::InvalidRange`] - `start_block > end_block`.
    /// * [`AuditError::InvalidDensityEstimate`] /
    ///   [`AuditError::WindowSizeUnderflow`] - unusable estimate.
    /// * [`AuditError::Rpc`] - the first failing window query. The scanner
    ///   has no retry or partial-result policy; recovery belongs to the
    ///   caller.
    pub async fn scan<S: EventSource>(
        &self,
        source: &S,
        start_block: u64,
        end_block: u64,
        events_per_block: f64,
        filter: &EventFilter,
    ) -> Result<Vec<RawEvent>, AuditError> {
        if start_block > end_block {
            return Err(AuditError::InvalidRange { start: start_block, end: end_block });
        }

        let chain_id = source.chain_id().await?;
        let window = self.limits.effective_window(chain_id, events_per_block)?;

        info!(chain_id, start_block, end_block, window, %filter, "Scanning block range");

        let mut events = Vec::new();
        for range in WindowIterator::new(start_block, end_block, window) {
            let batch = source.query_logs(range.clone(), filter).await?;
            debug!(
                window_start = *range.start(),
                window_end = *range.end(),
                count = batch.len(),
                "Fetched window"
            );
            events.extend(batch);
        }

        info!(event_count = events.len(), "Scan complete");
        Ok(events)
    }
}

/// Iterator yielding consecutive inclusive windows of at most `window_size`
/// blocks; the last window is clipped to `end`.
#[derive(Debug, Clone)]
pub struct WindowIterator {
    current: u64,
    end: u64,
    window_size: u64,
    done: bool,
}

impl WindowIterator {
    /// # Panics
    ///
    /// Panics if `window_size` is 0.
    #[must_use]
    pub fn new(start: u64, end: u64, window_size: u64) -> Self {
        assert!(window_size >= 1, "window size must be at least 1");
        Self { current: start, end, window_size, done: start > end }
    }
}

impl Iterator for WindowIterator {
    type Item = RangeInclusive<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let window_start = self.current;
        let window_end = window_start.saturating_add(self.window_size - 1).min(self.end);

        if window_end == self.end {
            self.done = true;
        } else {
            self.current = window_end + 1;
        }

        Some(window_start..=window_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_are_consecutive_and_clipped() {
        let mut iter = WindowIterator::new(100, 250, 50);
        assert_eq!(iter.next(), Some(100..=149));
        assert_eq!(iter.next(), Some(150..=199));
        assert_eq!(iter.next(), Some(200..=249));
        assert_eq!(iter.next(), Some(250..=250));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn single_window_when_range_fits() {
        let mut iter = WindowIterator::new(100, 120, 50);
        assert_eq!(iter.next(), Some(100..=120));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn exact_boundary_produces_no_empty_tail() {
        let mut iter = WindowIterator::new(100, 199, 50);
        assert_eq!(iter.next(), Some(100..=149));
        assert_eq!(iter.next(), Some(150..=199));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn degenerate_single_block_range() {
        let mut iter = WindowIterator::new(100, 100, 50);
        assert_eq!(iter.next(), Some(100..=100));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn inverted_range_is_empty() {
        let mut iter = WindowIterator::new(200, 100, 50);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn window_size_one_walks_block_by_block() {
        let mut iter = WindowIterator::new(100, 102, 1);
        assert_eq!(iter.next(), Some(100..=100));
        assert_eq!(iter.next(), Some(101..=101));
        assert_eq!(iter.next(), Some(102..=102));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn range_ending_at_u64_max_terminates() {
        let mut iter = WindowIterator::new(u64::MAX - 2, u64::MAX, 2);
        assert_eq!(iter.next(), Some(u64::MAX - 2..=u64::MAX - 1));
        assert_eq!(iter.next(), Some(u64::MAX..=u64::MAX));
        assert_eq!(iter.next(), None);
    }

    #[test]
    #[should_panic(expected = "window size must be at least 1")]
    fn zero_window_size_panics() {
        let _ = WindowIterator::new(100, 200, 0);
    }
}
