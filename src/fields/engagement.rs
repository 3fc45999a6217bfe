//! Engagement counter parsing.
//!
//! Counters appear as "1.2K", "3M", "1,234", "12 likes" or full ARIA labels
//! ("1,204 Likes. Like"). Parsing is total: anything without a number reads
//! as zero.

use dom_query::Selection;

use super::{FieldError, FieldResult, Found};
use crate::patterns::ENGAGEMENT_NUMBER;
use crate::result::Engagement;
use crate::selector::utils::label_or_text;
use crate::selector::SelectorGroup;

/// Parse an abbreviated count into an integer.
///
/// Commas, spaces and non-breaking spaces are thousands separators. A dot is a
/// decimal point when a magnitude suffix follows ("1.2K") and a thousands
/// separator otherwise ("1.234" in some locales). Invalid input yields `0`.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::fields::parse_engagement;
///
/// assert_eq!(parse_engagement("1.2K"), 1_200);
/// assert_eq!(parse_engagement("3M"), 3_000_000);
/// assert_eq!(parse_engagement("42"), 42);
/// assert_eq!(parse_engagement("n/a"), 0);
/// ```
#[must_use]
pub fn parse_engagement(raw: &str) -> u64 {
    let Some(caps) = ENGAGEMENT_NUMBER.captures(raw) else {
        return 0;
    };
    let Some(digits) = caps.get(1) else {
        return 0;
    };
    let suffix = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
    let multiplier: u64 = match suffix.as_deref() {
        Some("k") => 1_000,
        Some("m") => 1_000_000,
        Some("b") => 1_000_000_000,
        _ => 1,
    };

    let cleaned: String = digits
        .as_str()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{00a0}'))
        .collect();

    if multiplier == 1 {
        return parse_plain_count(&cleaned);
    }

    let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    let whole: u64 = whole.parse().unwrap_or(0);
    let fraction_digits: String = fraction.chars().take(9).collect();
    let fraction_value = if fraction_digits.is_empty() {
        0
    } else {
        let numerator: u64 = fraction_digits.parse().unwrap_or(0);
        let denominator = 10_u64.pow(u32::try_from(fraction_digits.len()).unwrap_or(0));
        numerator.saturating_mul(multiplier) / denominator
    };
    whole.saturating_mul(multiplier).saturating_add(fraction_value)
}

/// Count without suffix. A dot groups thousands only when every group after
/// it has exactly three digits ("1.234.567"); otherwise it is a decimal point
/// and the fraction is dropped ("1.5" reads as 1).
fn parse_plain_count(cleaned: &str) -> u64 {
    let mut groups = cleaned.split('.');
    let head = groups.next().unwrap_or_default();
    let tail: Vec<&str> = groups.collect();
    if !tail.is_empty() && tail.iter().all(|g| g.len() == 3) {
        return cleaned.replace('.', "").parse().unwrap_or(0);
    }
    head.parse().unwrap_or(0)
}

/// Extract one counter under `root`.
///
/// The counter element's ARIA label is preferred over its text. A counter
/// element that exists but shows no number (platforms hide zeroes) reads as 0.
pub fn extract_count(root: &Selection, group: &SelectorGroup) -> FieldResult<u64> {
    let resolved = group.first(root).ok_or(FieldError::NotFound(group.field))?;
    let label = label_or_text(&resolved.selection);
    Ok(Found::new(parse_engagement(&label), resolved.selector))
}

/// Groups for each counter; absent groups are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementSelectors {
    pub likes: Option<&'static SelectorGroup>,
    pub comments: Option<&'static SelectorGroup>,
    pub shares: Option<&'static SelectorGroup>,
    pub views: Option<&'static SelectorGroup>,
}

/// Extract every counter independently; each failure is reported separately.
pub fn extract_engagement(
    root: &Selection,
    selectors: &EngagementSelectors,
) -> (Engagement, Vec<FieldResult<()>>) {
    let mut engagement = Engagement::default();
    let mut outcomes = Vec::new();

    let mut take = |group: Option<&SelectorGroup>, slot: &mut Option<u64>| {
        let Some(group) = group else {
            return;
        };
        let outcome = extract_count(root, group);
        if let Ok(found) = &outcome {
            *slot = Some(found.value);
        }
        outcomes.push(outcome.map(|found| found.map(|_| ())));
    };

    take(selectors.likes, &mut engagement.likes);
    take(selectors.comments, &mut engagement.comments);
    take(selectors.shares, &mut engagement.shares);
    take(selectors.views, &mut engagement.views);

    (engagement, outcomes)
}
