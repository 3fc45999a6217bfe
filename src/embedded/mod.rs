//! Embedded Structured Data
//!
//! Platforms ship the data they render as JSON blobs inside the page: Schema.org
//! JSON-LD, TikTok's rehydration state, Instagram's relay payloads. Reading
//! them is faster and more reliable than walking the markup, so platform
//! extractors try them first.
//!
//! Every decoder is an explicit decode step into typed structs: a blob that is
//! present but does not decode is reported as
//! [`Error::MalformedEmbeddedData`](crate::Error::MalformedEmbeddedData), a
//! blob that decodes but carries no item is `Ok(None)`. Both send the caller
//! to the DOM pass.

pub mod instagram;
pub mod json_ld;
pub mod tiktok;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::fields::{hashtags_in_text, mentions_in_text, normalize_text, parse_engagement};
use crate::result::{
    Author, ContentKind, Engagement, ExtractedContent, KindDetails, MediaItem, Platform, Provenance,
    TimestampSource,
};

/// An item decoded from embedded data, before it becomes [`ExtractedContent`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedItem {
    pub id: Option<String>,
    pub kind: ContentKind,
    pub author: Author,
    pub text: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub engagement: Engagement,
    pub media: Vec<MediaItem>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    /// Kind-specific details, when the blob carries any.
    pub details: Option<KindDetails>,
    pub url: Option<String>,
    /// Path of the blob the item came from, e.g. `json-ld:VideoObject`.
    pub source: String,
}

impl EmbeddedItem {
    #[must_use]
    pub fn new(kind: ContentKind, source: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            author: Author::default(),
            text: None,
            timestamp: None,
            engagement: Engagement::default(),
            media: Vec::new(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            details: None,
            url: None,
            source: source.into(),
        }
    }

    /// Convert into an item with `embedded-json` provenance.
    ///
    /// `fallback_id` is used when the blob carries no id. Hashtags and
    /// mentions missing from the blob are scanned from the text.
    #[must_use]
    pub fn into_content(self, platform: Platform, fallback_id: &str) -> ExtractedContent {
        let kind = self.kind;
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| fallback_id.to_string());

        let mut content = ExtractedContent::new(platform, kind, id);
        if let Some(details) = self.details.filter(|d| d.kind() == kind) {
            content.details = details;
        }
        content.url = self.url;
        content.author = self.author;
        content.text = self.text.map(|t| normalize_text(&t)).unwrap_or_default();
        content.timestamp = self.timestamp;
        if content.timestamp.is_some() {
            content.metadata.timestamp_source = Some(TimestampSource::Machine);
        }
        content.engagement = self.engagement;
        content.media = self.media;
        content.hashtags = if self.hashtags.is_empty() {
            hashtags_in_text(&content.text)
        } else {
            self.hashtags
        };
        content.mentions = if self.mentions.is_empty() {
            mentions_in_text(&content.text)
        } else {
            self.mentions
        };
        content.metadata.provenance = Provenance::EmbeddedJson;
        content.note_selector(&self.source);
        content
    }
}

/// Fill the gaps of an embedded-data item from a DOM pass over the same page.
///
/// Values already present in `embedded` win. The result has `hybrid`
/// provenance and carries the selectors and errors of both passes.
pub fn merge_with_dom(embedded: &mut ExtractedContent, dom: ExtractedContent) {
    if embedded.text.trim().is_empty() {
        embedded.text = dom.text;
    }

    let author = &mut embedded.author;
    if author.handle.is_none() {
        author.handle = dom.author.handle;
    }
    if author.display_name.is_none() {
        author.display_name = dom.author.display_name;
    }
    author.verified |= dom.author.verified;

    if embedded.timestamp.is_none() && dom.timestamp.is_some() {
        embedded.timestamp = dom.timestamp;
        embedded.metadata.timestamp_source = dom.metadata.timestamp_source;
    }

    embedded.engagement.merge_missing(&dom.engagement);

    for item in dom.media {
        if !embedded.media.iter().any(|m| m.url == item.url) {
            embedded.media.push(item);
        }
    }
    for tag in dom.hashtags {
        if !embedded.hashtags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            embedded.hashtags.push(tag);
        }
    }
    for mention in dom.mentions {
        if !embedded.mentions.iter().any(|m| m.eq_ignore_ascii_case(&mention)) {
            embedded.mentions.push(mention);
        }
    }

    if embedded.details == KindDetails::for_kind(embedded.kind()) && dom.details.kind() == embedded.kind() {
        embedded.details = dom.details;
    }
    if embedded.url.is_none() {
        embedded.url = dom.url;
    }

    for selector in &dom.metadata.selectors_used {
        embedded.note_selector(selector);
    }
    embedded.metadata.errors.extend(dom.metadata.errors);
    embedded.metadata.provenance = Provenance::Hybrid;
}

/// A JSON value that platforms encode as a number or as a string, depending on
/// the payload version (`"diggCount": 12` vs `"diggCount": "12"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FlexNumber {
    Int(u64),
    Float(f64),
    Text(String),
}

impl FlexNumber {
    /// Numeric value. Strings go through the engagement parser ("1.2K").
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.is_finite() && *f >= 0.0 => Some(f.round() as u64),
            Self::Float(_) => None,
            Self::Text(s) => {
                let s = s.trim();
                if s.is_empty() || !s.chars().any(|c| c.is_ascii_digit()) {
                    None
                } else {
                    Some(parse_engagement(s))
                }
            }
        }
    }

    /// Value as an id string.
    #[must_use]
    pub fn as_id(&self) -> Option<String> {
        match self {
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(format!("{f:.0}")),
            Self::Float(_) => None,
            Self::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        }
    }
}

/// Epoch seconds to a timestamp, rejecting zero and out-of-range values.
pub(crate) fn epoch_seconds(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    DateTime::from_timestamp(value, 0)
}
