//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::options::ThrottleOptions;

/// Retry delay policy: `min(initial * multiplier^(attempt-1), max)` plus up to
/// `jitter_ratio` of that as random jitter, for at most `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
    pub jitter_ratio: f64,
    pub max_attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn from_options(options: &ThrottleOptions) -> Self {
        Self {
            initial: Duration::from_millis(options.initial_backoff_ms),
            multiplier: options.backoff_multiplier.max(1.0),
            max: Duration::from_millis(options.max_backoff_ms),
            jitter_ratio: options.jitter_ratio.clamp(0.0, 1.0),
            max_attempts: options.max_attempts.max(1),
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use rs_social_extract::options::ThrottleOptions;
    /// use rs_social_extract::throttle::Backoff;
    ///
    /// let backoff = Backoff::from_options(&ThrottleOptions::default());
    /// assert_eq!(backoff.base_delay(1), Duration::from_millis(1_000));
    /// assert_eq!(backoff.base_delay(3), Duration::from_millis(4_000));
    /// assert_eq!(backoff.base_delay(10), Duration::from_millis(10_000));
    /// ```
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let factor = self.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let millis = self.initial.as_millis() as f64 * factor;
        let capped = millis.min(self.max.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay with a given jitter fraction in `[0, 1]` of the jitter ratio.
    #[must_use]
    pub fn delay_with_jitter(&self, attempt: u32, fraction: f64) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = base.mul_f64(self.jitter_ratio * fraction.clamp(0.0, 1.0));
        base + jitter
    }

    /// Delay before retry number `attempt`, with random jitter.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let fraction = rand::rng().random_range(0.0..=1.0);
        self.delay_with_jitter(attempt, fraction)
    }

    /// Whether another attempt may follow attempt number `attempt`.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_options(&ThrottleOptions::default())
    }
}
