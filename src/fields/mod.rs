//! Field Extractors
//!
//! Each field is extracted in three steps: resolve a [`SelectorGroup`]
//! scoped to the content root, normalize the raw text, then validate it
//! against field-specific rules. A failing field never aborts extraction:
//! [`record`] turns the failure into a non-fatal error on the item's
//! metadata and the caller moves on.
//!
//! [`SelectorGroup`]: crate::selector::SelectorGroup

pub mod author;
pub mod engagement;
pub mod media;
pub mod tags;
pub mod text;
pub mod timestamp;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::patterns::WHITESPACE_NORMALIZE;
use crate::result::ExtractedContent;

pub use author::{clean_handle, handle_from_href, AuthorSelectors};
pub use engagement::parse_engagement;
pub use media::extract_media;
pub use tags::{extract_hashtags, extract_mentions, hashtags_in_text, mentions_in_text};
pub use text::TextRules;
pub use timestamp::{parse_machine_timestamp, parse_relative_timestamp};

/// A field value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Found<T> {
    pub value: T,

    /// Selector (or embedded-data path) that produced the value.
    pub selector: String,

    /// Non-fatal remark, e.g. a truncation.
    pub note: Option<String>,
}

impl<T> Found<T> {
    #[must_use]
    pub fn new(value: T, selector: impl Into<String>) -> Self {
        Self {
            value,
            selector: selector.into(),
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Transform the value, keeping provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Found<U> {
        Found {
            value: f(self.value),
            selector: self.selector,
            note: self.note,
        }
    }
}

/// Why a field could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// No selector in the group matched.
    #[error("{0}: no selector matched")]
    NotFound(&'static str),

    /// A value was found but failed validation.
    #[error("{field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl FieldError {
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Outcome of one field extraction.
pub type FieldResult<T> = std::result::Result<Found<T>, FieldError>;

/// Record a field outcome on `content` and return the value, if any.
///
/// Successful selectors land in `metadata.selectors_used`; failures and notes
/// land in `metadata.errors`.
pub fn record<T>(content: &mut ExtractedContent, outcome: FieldResult<T>) -> Option<T> {
    match outcome {
        Ok(found) => {
            content.note_selector(&found.selector);
            if let Some(note) = found.note {
                content.note_error(note);
            }
            Some(found.value)
        }
        Err(err) => {
            content.note_error(err.to_string());
            None
        }
    }
}

/// Record an outcome for an optional field: absence is not an error.
pub fn record_optional<T>(content: &mut ExtractedContent, outcome: FieldResult<T>) -> Option<T> {
    match outcome {
        Err(FieldError::NotFound(_)) => None,
        other => record(content, other),
    }
}

/// Normalize raw text: drop control and zero-width characters, collapse
/// whitespace, trim.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::fields::normalize_text;
///
/// assert_eq!(normalize_text("  Hello\n\n  world\u{200b}\u{0007} "), "Hello world");
/// ```
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !is_stripped_char(*c)).collect();
    WHITESPACE_NORMALIZE.replace_all(cleaned.trim(), " ").into_owned()
}

/// Deterministic id for an item the page does not identify, derived from its
/// author handle and text. Prefixed `syn-` so it never collides with a
/// platform id.
#[must_use]
pub fn synthetic_id(content: &ExtractedContent) -> String {
    let mut hasher = DefaultHasher::new();
    content.platform.hash(&mut hasher);
    content.author.handle.hash(&mut hasher);
    content.text.hash(&mut hasher);
    format!("syn-{:016x}", hasher.finish())
}

fn is_stripped_char(c: char) -> bool {
    (c.is_control() && !c.is_whitespace())
        || matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{feff}')
}
