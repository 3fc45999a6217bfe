//! Utility functions for selector rules
//!
//! Helpers used by rule predicates and field extractors for common attribute
//! and text access.

use crate::dom;
use dom_query::Selection;

/// Get any attribute (empty string if missing)
#[inline]
#[must_use]
pub fn attr(sel: &Selection, name: &str) -> String {
    dom::get_attribute(sel, name).unwrap_or_default()
}

/// Get tag name (empty string if missing)
#[inline]
#[must_use]
pub fn tag(sel: &Selection) -> String {
    dom::tag_name(sel).unwrap_or_default()
}

/// Get element class attribute (empty string if missing)
#[inline]
#[must_use]
pub fn class(sel: &Selection) -> String {
    attr(sel, "class")
}

/// Label of an interactive element: `aria-label` when present, else its text.
///
/// Counter buttons usually carry the full figure ("1,204 Likes") in the label
/// while the visible text is abbreviated ("1.2K").
#[must_use]
pub fn label_or_text(sel: &Selection) -> String {
    dom::non_empty_attribute(sel, "aria-label")
        .unwrap_or_else(|| crate::fields::normalize_text(&dom::text_content(sel)))
}

/// Trimmed text content.
#[must_use]
pub fn trimmed_text(sel: &Selection) -> String {
    crate::fields::normalize_text(&dom::text_content(sel))
}
