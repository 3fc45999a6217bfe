//! Configuration options for content extraction.
//!
//! `Options` controls caching, throttling, observation, pagination and
//! scoring. Every group derives `Deserialize` with `#[serde(default)]`, so a
//! TOML file or a host settings message only needs to name the fields it
//! changes. Durations are stored as milliseconds and exposed through
//! accessor methods.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Result cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Entry lifetime.
    ///
    /// Default: `300_000` (5 minutes)
    pub ttl_ms: u64,

    /// Maximum number of entries before a bulk eviction.
    ///
    /// Default: `100`
    pub max_entries: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_entries: 100,
        }
    }
}

impl CacheOptions {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Rate limiting, retry and deadline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleOptions {
    /// Minimum delay between successive item extractions.
    pub between_items_ms: u64,

    /// Minimum delay before the next operation after an error.
    pub after_error_ms: u64,

    /// Minimum delay between page transitions.
    pub page_transition_ms: u64,

    /// Minimum delay between "load more" interactions.
    pub load_more_ms: u64,

    /// First retry delay.
    pub initial_backoff_ms: u64,

    pub backoff_multiplier: f64,

    pub max_backoff_ms: u64,

    /// Upper bound of the random jitter, as a fraction of the delay.
    pub jitter_ratio: f64,

    /// Total attempts per extraction call, the first one included.
    pub max_attempts: u32,

    /// Deadline raced against every extraction attempt.
    pub extraction_timeout_ms: u64,

    /// Length of a rate-limiting session.
    pub session_duration_ms: u64,

    /// Overrides every per-kind session cap when set.
    pub session_cap_override: Option<u32>,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            between_items_ms: 500,
            after_error_ms: 2_000,
            page_transition_ms: 1_000,
            load_more_ms: 800,
            initial_backoff_ms: 1_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10_000,
            jitter_ratio: 0.3,
            max_attempts: 3,
            extraction_timeout_ms: 10_000,
            session_duration_ms: 30 * 60 * 1_000,
            session_cap_override: None,
        }
    }
}

impl ThrottleOptions {
    #[must_use]
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    #[must_use]
    pub fn session_duration(&self) -> Duration {
        Duration::from_millis(self.session_duration_ms)
    }

    /// Options with every delay set to zero, for batch or offline use.
    #[must_use]
    pub fn unthrottled() -> Self {
        Self {
            between_items_ms: 0,
            after_error_ms: 0,
            page_transition_ms: 0,
            load_more_ms: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            ..Self::default()
        }
    }
}

/// Dynamic content observer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverOptions {
    /// Quiet period that closes a burst of mutations.
    ///
    /// Default: `500`
    pub debounce_ms: u64,

    /// Attributes whose changes count as relevant mutations.
    pub attribute_allow_list: Vec<String>,

    /// Maximum number of processed identities remembered.
    ///
    /// Default: `5000`
    pub max_tracked: usize,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            attribute_allow_list: ["class", "id", "role", "style", "aria-hidden", "data-testid", "data-e2e"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            max_tracked: 5_000,
        }
    }
}

impl ObserverOptions {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Thread and comment pagination configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Maximum "load more" iterations per call.
    pub max_iterations: usize,

    /// Interval between loading-indicator polls.
    pub poll_interval_ms: u64,

    /// How long to wait for a loading indicator to disappear.
    pub loading_timeout_ms: u64,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            poll_interval_ms: 100,
            loading_timeout_ms: 5_000,
        }
    }
}

impl PaginationOptions {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.loading_timeout_ms)
    }
}

/// Confidence weights. The score is the capped sum of present signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub text: f64,
    /// Awarded in full only when both handle and display name are present.
    pub author: f64,
    /// Share of `author` withheld until the author is complete.
    pub author_completeness_bonus: f64,
    pub timestamp: f64,
    /// Multiplier applied to relative-text timestamps.
    pub relative_timestamp_factor: f64,
    pub engagement: f64,
    pub auxiliary: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            text: 0.4,
            author: 0.25,
            author_completeness_bonus: 0.05,
            timestamp: 0.15,
            relative_timestamp_factor: 0.5,
            engagement: 0.1,
            auxiliary: 0.1,
        }
    }
}

/// Feature switches the host can flip at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    /// Try embedded structured data before the DOM.
    pub use_embedded_data: bool,

    /// Drive "show more" interactions for threads and comments.
    pub expand_threads: bool,

    /// React to DOM mutations after the initial pass.
    pub observe_mutations: bool,

    /// Refuse to extract when the page signals a tracking preference.
    pub respect_tracking_preference: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            use_embedded_data: true,
            expand_threads: true,
            observe_mutations: true,
            respect_tracking_preference: true,
        }
    }
}

/// Configuration options for the extraction engine.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::Options;
///
/// let options = Options::from_toml_str(r#"
///     [cache]
///     max_entries = 20
///
///     [throttle]
///     max_attempts = 5
/// "#)?;
/// assert_eq!(options.cache.max_entries, 20);
/// assert_eq!(options.throttle.max_attempts, 5);
/// assert_eq!(options.observer.debounce_ms, 500);
/// # Ok::<(), rs_social_extract::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub cache: CacheOptions,
    pub throttle: ThrottleOptions,
    pub observer: ObserverOptions,
    pub pagination: PaginationOptions,
    pub confidence: ConfidenceWeights,
    pub features: FeatureFlags,

    /// Embedded-data results at or above this confidence skip the DOM pass.
    ///
    /// Default: `0.7`
    pub embedded_confidence_threshold: f64,

    /// Replies collected per item at most.
    ///
    /// Default: `200`
    pub max_replies: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            throttle: ThrottleOptions::default(),
            observer: ObserverOptions::default(),
            pagination: PaginationOptions::default(),
            confidence: ConfidenceWeights::default(),
            features: FeatureFlags::default(),
            embedded_confidence_threshold: 0.7,
            max_replies: 200,
        }
    }
}

impl Options {
    /// Parse options from TOML. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Options suitable for one-shot extraction of saved pages.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            throttle: ThrottleOptions::unthrottled(),
            features: FeatureFlags {
                expand_threads: false,
                observe_mutations: false,
                ..FeatureFlags::default()
            },
            ..Self::default()
        }
    }

    /// Apply a host override set on top of these options.
    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(ms) = overrides.between_items_ms {
            self.throttle.between_items_ms = ms;
        }
        if let Some(ms) = overrides.extraction_timeout_ms {
            self.throttle.extraction_timeout_ms = ms;
        }
        if let Some(attempts) = overrides.max_attempts {
            self.throttle.max_attempts = attempts.max(1);
        }
        if overrides.session_cap.is_some() {
            self.throttle.session_cap_override = overrides.session_cap;
        }
        if let Some(flags) = &overrides.features {
            self.features = flags.clone();
        }
    }
}

/// Subset of options the host may override at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverrides {
    pub between_items_ms: Option<u64>,
    pub extraction_timeout_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub session_cap: Option<u32>,
    pub features: Option<FeatureFlags>,
}
