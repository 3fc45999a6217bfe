//! Confidence scoring for extracted items.
//!
//! The score is a deterministic weighted sum of present signals, capped at
//! 1.0. It describes completeness, not correctness: the only decision taken on
//! it inside the crate is whether an embedded-data result is good enough to
//! skip the DOM pass.

use crate::options::ConfidenceWeights;
use crate::result::{ExtractedContent, TimestampSource};

/// Texts at least this long get the full text weight.
const FULL_QUALITY_CHARS: usize = 20;

/// Engagement counters tracked per item (likes, comments, shares, views).
const ENGAGEMENT_FIELDS: usize = 4;

/// Which fields were extracted, reduced to what the scorer looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceSignals {
    /// Length of the primary text in characters.
    pub text_chars: usize,
    pub has_handle: bool,
    pub has_display_name: bool,
    pub timestamp: Option<TimestampSource>,
    /// Number of engagement counters present.
    pub engagement_fields: usize,
    pub media_count: usize,
    pub has_music: bool,
}

impl ConfidenceSignals {
    /// Read the signals off an item.
    #[must_use]
    pub fn from_content(content: &ExtractedContent) -> Self {
        Self {
            text_chars: content.text.trim().chars().count(),
            has_handle: content.author.handle.as_deref().is_some_and(|h| !h.is_empty()),
            has_display_name: content.author.display_name.as_deref().is_some_and(|n| !n.is_empty()),
            timestamp: content.timestamp.and(content.metadata.timestamp_source),
            engagement_fields: content.engagement.present_count(),
            media_count: content.media.len(),
            has_music: content.details.music().is_some(),
        }
    }
}

/// Score `signals` with `weights`.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::confidence::{score, ConfidenceSignals};
/// use rs_social_extract::options::ConfidenceWeights;
///
/// let weights = ConfidenceWeights::default();
/// let bare = ConfidenceSignals { text_chars: 120, ..ConfidenceSignals::default() };
/// let with_author = ConfidenceSignals { has_handle: true, ..bare };
/// assert!(score(&with_author, &weights) > score(&bare, &weights));
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(signals: &ConfidenceSignals, weights: &ConfidenceWeights) -> f64 {
    let mut total = 0.0;

    if signals.text_chars > 0 {
        let quality = if signals.text_chars >= FULL_QUALITY_CHARS {
            1.0
        } else {
            0.5 + 0.5 * signals.text_chars as f64 / FULL_QUALITY_CHARS as f64
        };
        total += weights.text * quality;
    }

    match (signals.has_handle, signals.has_display_name) {
        (true, true) => total += weights.author,
        (true, false) | (false, true) => total += (weights.author - weights.author_completeness_bonus).max(0.0),
        (false, false) => {}
    }

    match signals.timestamp {
        Some(TimestampSource::Machine) => total += weights.timestamp,
        Some(TimestampSource::Relative) => total += weights.timestamp * weights.relative_timestamp_factor.clamp(0.0, 1.0),
        None => {}
    }

    let counters = signals.engagement_fields.min(ENGAGEMENT_FIELDS);
    total += weights.engagement * counters as f64 / ENGAGEMENT_FIELDS as f64;

    if signals.media_count > 0 || signals.has_music {
        total += weights.auxiliary;
    }

    total.clamp(0.0, 1.0)
}

/// Score an item and store the result in its metadata.
pub fn assign(content: &mut ExtractedContent, weights: &ConfidenceWeights) -> f64 {
    let value = score(&ConfidenceSignals::from_content(content), weights);
    content.metadata.confidence = value;
    value
}
