//! Session window: per-kind item caps and error counters.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::result::ContentKind;

/// Static per-platform item caps within one session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Cap for kinds not listed in `per_kind`.
    pub default_cap: u32,
    pub per_kind: &'static [(ContentKind, u32)],
}

impl SessionLimits {
    /// Cap for `kind`, honoring a host-supplied override.
    #[must_use]
    pub fn cap_for(&self, kind: ContentKind, cap_override: Option<u32>) -> u32 {
        cap_override.unwrap_or_else(|| {
            self.per_kind
                .iter()
                .find(|(k, _)| *k == kind)
                .map_or(self.default_cap, |(_, cap)| *cap)
        })
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            default_cap: 500,
            per_kind: &[],
        }
    }
}

/// Outcome of a session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl RateLimitDecision {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Mutable session state owned by one extractor.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub started: Instant,
    pub started_at: DateTime<Utc>,
    pub item_counts: HashMap<ContentKind, u32>,
    pub error_counts: HashMap<ErrorKind, u32>,
    pub last_extraction: Option<Instant>,
    pub retry_count: u32,
    duration: Duration,
}

impl SessionState {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            started_at: Utc::now(),
            item_counts: HashMap::new(),
            error_counts: HashMap::new(),
            last_extraction: None,
            retry_count: 0,
            duration,
        }
    }

    /// Start a fresh session.
    pub fn reset(&mut self) {
        *self = Self::new(self.duration);
    }

    /// Reset when the session is older than its window. Returns whether it reset.
    pub fn reset_if_expired(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.started) > self.duration {
            info!(session = %self.id, "session window elapsed, resetting");
            self.reset();
            return true;
        }
        false
    }

    /// Decide whether one more `kind` item may be extracted.
    #[must_use]
    pub fn check(&self, kind: ContentKind, limits: &SessionLimits, cap_override: Option<u32>) -> RateLimitDecision {
        let cap = limits.cap_for(kind, cap_override);
        let used = self.count(kind);
        if used >= cap {
            return RateLimitDecision::deny(format!(
                "session cap of {cap} {kind} items reached; resets after {} s",
                self.duration.as_secs()
            ));
        }
        RateLimitDecision::allow()
    }

    /// Count one extracted item.
    pub fn record_item(&mut self, kind: ContentKind, now: Instant) {
        *self.item_counts.entry(kind).or_insert(0) += 1;
        self.last_extraction = Some(now);
    }

    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.error_counts.entry(kind).or_insert(0) += 1;
    }

    #[must_use]
    pub fn count(&self, kind: ContentKind) -> u32 {
        self.item_counts.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn errors(&self, kind: ErrorKind) -> u32 {
        self.error_counts.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: SessionLimits = SessionLimits {
        default_cap: 10,
        per_kind: &[(ContentKind::Story, 2)],
    };

    #[test]
    fn test_cap_denies_with_reason() {
        let mut session = SessionState::new(Duration::from_secs(60));
        let now = Instant::now();
        assert!(session.check(ContentKind::Story, &LIMITS, None).allowed);
        session.record_item(ContentKind::Story, now);
        session.record_item(ContentKind::Story, now);

        let decision = session.check(ContentKind::Story, &LIMITS, None);
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("story"));

        assert!(session.check(ContentKind::Post, &LIMITS, None).allowed);
    }

    #[test]
    fn test_override_replaces_static_caps() {
        let mut session = SessionState::new(Duration::from_secs(60));
        session.record_item(ContentKind::Post, Instant::now());
        assert!(!session.check(ContentKind::Post, &LIMITS, Some(1)).allowed);
        assert!(session.check(ContentKind::Story, &LIMITS, Some(5)).allowed);
    }

    #[test]
    fn test_reset_after_window() {
        let mut session = SessionState::new(Duration::from_secs(60));
        let id = session.id;
        let now = session.started;
        session.record_item(ContentKind::Story, now);
        session.record_error(ErrorKind::ExtractionTimeout);

        assert!(!session.reset_if_expired(now + Duration::from_secs(30)));
        assert_eq!(session.count(ContentKind::Story), 1);

        assert!(session.reset_if_expired(now + Duration::from_secs(61)));
        assert_ne!(session.id, id);
        assert_eq!(session.count(ContentKind::Story), 0);
        assert_eq!(session.errors(ErrorKind::ExtractionTimeout), 0);
    }
}
