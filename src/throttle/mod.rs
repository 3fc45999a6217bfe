//! Rate Limiter / Backoff Controller
//!
//! Self-throttling for extraction work. A minimum-delay table gates each kind
//! of operation, [`Backoff`] spaces out retries, and [`SessionState`] caps how
//! many items of each kind one extractor processes per session window.

pub mod backoff;
pub mod session;

use std::cell::Cell;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::trace;

use crate::options::ThrottleOptions;

pub use backoff::Backoff;
pub use session::{RateLimitDecision, SessionLimits, SessionState};

/// Gated operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelayKind {
    /// Between successive item extractions.
    BetweenItems,
    /// After a failed attempt.
    AfterError,
    /// Between page transitions or navigations.
    PageTransition,
    /// Between "load more" interactions.
    LoadMore,
}

/// Minimum delays per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayTable {
    pub between_items: Duration,
    pub after_error: Duration,
    pub page_transition: Duration,
    pub load_more: Duration,
}

impl DelayTable {
    #[must_use]
    pub fn from_options(options: &ThrottleOptions) -> Self {
        Self {
            between_items: Duration::from_millis(options.between_items_ms),
            after_error: Duration::from_millis(options.after_error_ms),
            page_transition: Duration::from_millis(options.page_transition_ms),
            load_more: Duration::from_millis(options.load_more_ms),
        }
    }

    #[must_use]
    pub fn get(&self, kind: DelayKind) -> Duration {
        match kind {
            DelayKind::BetweenItems => self.between_items,
            DelayKind::AfterError => self.after_error,
            DelayKind::PageTransition => self.page_transition,
            DelayKind::LoadMore => self.load_more,
        }
    }
}

/// Enforces minimum delays between gated operations.
///
/// The limiter remembers when the last gated operation ran; [`RateLimiter::wait`]
/// sleeps until `last + delay(kind)` has passed. The first operation is never
/// delayed.
#[derive(Debug)]
pub struct RateLimiter {
    delays: Cell<DelayTable>,
    last: Cell<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(options: &ThrottleOptions) -> Self {
        Self {
            delays: Cell::new(DelayTable::from_options(options)),
            last: Cell::new(None),
        }
    }

    /// Time still to wait before a `kind` operation may start at `now`.
    #[must_use]
    pub fn remaining(&self, kind: DelayKind, now: Instant) -> Duration {
        self.last
            .get()
            .map_or(Duration::ZERO, |last| (last + self.delays.get().get(kind)).saturating_duration_since(now))
    }

    /// Sleep until a `kind` operation is allowed, then mark it as started.
    pub async fn wait(&self, kind: DelayKind) {
        let now = Instant::now();
        let remaining = self.remaining(kind, now);
        if !remaining.is_zero() {
            trace!(?kind, wait_ms = remaining.as_millis() as u64, "throttling");
            sleep_until(now + remaining).await;
        }
        self.last.set(Some(Instant::now()));
    }

    /// Mark an operation as started without waiting.
    pub fn mark(&self) {
        self.last.set(Some(Instant::now()));
    }

    #[must_use]
    pub fn delays(&self) -> DelayTable {
        self.delays.get()
    }

    /// Replace the delay table, e.g. after a host settings override.
    pub fn set_delays(&self, delays: DelayTable) {
        self.delays.set(delays);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_operation_is_not_delayed() {
        let limiter = RateLimiter::new(&ThrottleOptions::default());
        let start = Instant::now();
        limiter.wait(DelayKind::BetweenItems).await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimum_delay_between_items() {
        let limiter = RateLimiter::new(&ThrottleOptions::default());
        limiter.wait(DelayKind::BetweenItems).await;
        let start = Instant::now();
        limiter.wait(DelayKind::BetweenItems).await;
        assert_eq!(Instant::now() - start, Duration::from_millis(500));

        limiter.wait(DelayKind::AfterError).await;
        assert_eq!(Instant::now() - start, Duration::from_millis(2_500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_delay() {
        let limiter = RateLimiter::new(&ThrottleOptions::default());
        limiter.mark();
        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(limiter.remaining(DelayKind::BetweenItems, Instant::now()), Duration::from_millis(200));
        assert_eq!(limiter.remaining(DelayKind::PageTransition, Instant::now()), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_delays_applies_to_next_wait() {
        let limiter = RateLimiter::new(&ThrottleOptions::default());
        limiter.wait(DelayKind::BetweenItems).await;
        limiter.set_delays(DelayTable::from_options(&ThrottleOptions::unthrottled()));
        let start = Instant::now();
        limiter.wait(DelayKind::BetweenItems).await;
        assert_eq!(Instant::now(), start);
    }

    #[test]
    fn test_unthrottled_table_is_zero() {
        let table = DelayTable::from_options(&ThrottleOptions::unthrottled());
        for kind in [DelayKind::BetweenItems, DelayKind::AfterError, DelayKind::PageTransition, DelayKind::LoadMore] {
            assert!(table.get(kind).is_zero());
        }
    }
}
