//! Result types for extraction output.
//!
//! This module defines the structured content handed to the downstream
//! analysis service, together with the metadata describing how it was
//! obtained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Platform an item was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Short-post platform (twitter.com / x.com).
    Twitter,
    /// Micro-video platform (tiktok.com).
    TikTok,
    /// Photo and story platform (instagram.com).
    Instagram,
    /// Any other page, handled by the readability extractor.
    Generic,
}

impl Platform {
    /// Lowercase name used in logs and cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content item. Used for session counters and analysis routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    Story,
    Reel,
    Tweet,
    ThreadEntry,
    Video,
    Comment,
    Article,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Story => "story",
            Self::Reel => "reel",
            Self::Tweet => "tweet",
            Self::ThreadEntry => "thread_entry",
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Article => "article",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background audio attached to a video or reel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicInfo {
    pub title: String,
    pub artist: Option<String>,
}

/// Kind-specific details. The variant always agrees with [`ContentKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindDetails {
    Tweet {
        is_retweet: bool,
        is_reply: bool,
        quoted_id: Option<String>,
    },
    ThreadEntry {
        /// Zero-based position in the thread, the root tweet excluded.
        position: usize,
        root_id: String,
    },
    Video {
        music: Option<MusicInfo>,
        duration_secs: Option<u32>,
    },
    Post {
        location: Option<String>,
        /// Number of slides when the post is a carousel.
        carousel_len: usize,
    },
    Reel {
        music: Option<MusicInfo>,
    },
    Story {
        expires_at: Option<DateTime<Utc>>,
    },
    Comment {
        parent_id: Option<String>,
        is_reply: bool,
    },
    Article {
        title: Option<String>,
    },
}

impl KindDetails {
    /// The content kind this variant describes.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Tweet { .. } => ContentKind::Tweet,
            Self::ThreadEntry { .. } => ContentKind::ThreadEntry,
            Self::Video { .. } => ContentKind::Video,
            Self::Post { .. } => ContentKind::Post,
            Self::Reel { .. } => ContentKind::Reel,
            Self::Story { .. } => ContentKind::Story,
            Self::Comment { .. } => ContentKind::Comment,
            Self::Article { .. } => ContentKind::Article,
        }
    }

    /// Default details for a kind.
    #[must_use]
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Tweet => Self::Tweet {
                is_retweet: false,
                is_reply: false,
                quoted_id: None,
            },
            ContentKind::ThreadEntry => Self::ThreadEntry {
                position: 0,
                root_id: String::new(),
            },
            ContentKind::Video => Self::Video {
                music: None,
                duration_secs: None,
            },
            ContentKind::Post => Self::Post {
                location: None,
                carousel_len: 0,
            },
            ContentKind::Reel => Self::Reel { music: None },
            ContentKind::Story => Self::Story { expires_at: None },
            ContentKind::Comment => Self::Comment {
                parent_id: None,
                is_reply: false,
            },
            ContentKind::Article => Self::Article { title: None },
        }
    }

    /// Music attached to the item, if the kind carries any.
    #[must_use]
    pub fn music(&self) -> Option<&MusicInfo> {
        match self {
            Self::Video { music, .. } | Self::Reel { music } => music.as_ref(),
            _ => None,
        }
    }
}

/// Author of a content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Account handle without the leading `@`.
    pub handle: Option<String>,

    /// Human display name.
    pub display_name: Option<String>,

    pub verified: bool,
}

impl Author {
    /// True when neither handle nor display name is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handle.as_deref().is_none_or(str::is_empty)
            && self.display_name.as_deref().is_none_or(str::is_empty)
    }

    /// True when both handle and display name are known.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.handle.as_deref().is_some_and(|h| !h.is_empty())
            && self.display_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Engagement counters. Each counter is extracted independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
    pub views: Option<u64>,
}

impl Engagement {
    /// Number of counters that were extracted.
    #[must_use]
    pub fn present_count(&self) -> usize {
        [self.likes, self.comments, self.shares, self.views]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    /// Fill counters missing here from `other`.
    pub fn merge_missing(&mut self, other: &Self) {
        self.likes = self.likes.or(other.likes);
        self.comments = self.comments.or(other.comments);
        self.shares = self.shares.or(other.shares);
        self.views = self.views.or(other.views);
    }
}

/// Media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

/// A media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_type: MediaType,

    /// Absolute URL with known tracking parameters removed.
    pub url: String,

    pub width: Option<u32>,
    pub height: Option<u32>,

    /// Poster frame for videos.
    pub poster: Option<String>,

    /// Alt text for images.
    pub alt: Option<String>,
}

/// Which resolution path produced an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    #[default]
    Dom,
    EmbeddedJson,
    Hybrid,
}

/// Where a timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// Machine-readable attribute or embedded epoch.
    Machine,
    /// Relative human text ("2h ago") resolved against extraction time.
    Relative,
}

/// How an item was extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Self-assessed completeness in `[0, 1]`.
    pub confidence: f64,

    /// Selector strings (or embedded-data paths) that produced a value.
    pub selectors_used: Vec<String>,

    /// Non-fatal errors encountered during extraction.
    pub errors: Vec<String>,

    pub provenance: Provenance,

    pub timestamp_source: Option<TimestampSource>,

    /// Wall time spent extracting, in milliseconds.
    pub extraction_ms: u64,

    pub extracted_at: Option<DateTime<Utc>>,

    /// Set on placeholder results produced from a failed call.
    pub failure: Option<ErrorKind>,
}

/// A structured content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Platform-local id, synthesized from the text when the page has none.
    pub id: String,

    pub platform: Platform,

    pub details: KindDetails,

    /// Canonical URL of the item, when known.
    pub url: Option<String>,

    pub author: Author,

    /// Primary text.
    pub text: String,

    /// Absent when the page timestamp could not be parsed.
    pub timestamp: Option<DateTime<Utc>>,

    pub engagement: Engagement,

    pub media: Vec<MediaItem>,

    pub hashtags: Vec<String>,

    pub mentions: Vec<String>,

    /// Thread entries or comments revealed by pagination.
    pub replies: Vec<ExtractedContent>,

    pub metadata: ExtractionMetadata,
}

impl ExtractedContent {
    /// Empty item of the given kind.
    #[must_use]
    pub fn new(platform: Platform, kind: ContentKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
            details: KindDetails::for_kind(kind),
            url: None,
            author: Author::default(),
            text: String::new(),
            timestamp: None,
            engagement: Engagement::default(),
            media: Vec::new(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            replies: Vec::new(),
            metadata: ExtractionMetadata::default(),
        }
    }

    /// Minimal well-formed result for a failed call.
    #[must_use]
    pub fn placeholder(platform: Platform, url: Option<&str>, kind: ErrorKind, reason: &str) -> Self {
        let mut content = Self::new(platform, ContentKind::Article, String::new());
        content.url = url.map(str::to_string);
        content.metadata.errors.push(reason.to_string());
        content.metadata.failure = Some(kind);
        content
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    /// Usable downstream only when text or author is non-empty.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.text.trim().is_empty() || !self.author.is_empty()
    }

    /// Record a non-fatal error.
    pub fn note_error(&mut self, message: impl Into<String>) {
        self.metadata.errors.push(message.into());
    }

    /// Record a selector that produced a value.
    pub fn note_selector(&mut self, selector: &str) {
        if !self.metadata.selectors_used.iter().any(|s| s == selector) {
            self.metadata.selectors_used.push(selector.to_string());
        }
    }
}
