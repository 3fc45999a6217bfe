//! Compiled regex patterns for field extraction.
//!
//! All patterns are compiled once at startup using `LazyLock` for efficiency.
//! Patterns are organized by the field they serve.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Text Normalization
// =============================================================================

/// Runs of whitespace, collapsed to a single space.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex"));

// =============================================================================
// Engagement Counters
// =============================================================================

/// A number with optional separators and a K/M/B magnitude suffix.
///
/// The suffix must end a word so "12 likes" does not read as "12k".
pub static ENGAGEMENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,\s\u{00a0}]*\d|\d)\s*([kmb])?(?:\b|$)").expect("ENGAGEMENT_NUMBER regex")
});

// =============================================================================
// Hashtags and Mentions
// =============================================================================

/// `#tag` in running text. Unicode word characters, not starting inside a word.
pub static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w&/])#(\w{1,100})").expect("HASHTAG regex"));

/// `@handle` in running text. Excludes e-mail addresses.
pub static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w.])@([A-Za-z0-9_.]{1,30})").expect("MENTION regex"));

/// Hashtag links across platforms: `/hashtag/x`, `/tag/x`, `/explore/tags/x/`.
pub static HASHTAG_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:hashtag|tag|explore/tags)/([^/?#]+)").expect("HASHTAG_HREF regex")
});

// =============================================================================
// Relative Time
// =============================================================================

/// Compact or spelled-out relative times: "2h", "5 min ago", "3 days ago".
pub static RELATIVE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+)\s*(s|sec|secs|second|seconds|m|min|mins|minute|minutes|h|hr|hrs|hour|hours|d|day|days|w|wk|wks|week|weeks|mo|month|months|y|yr|yrs|year|years)\.?(?:\s+ago)?$",
    )
    .expect("RELATIVE_TIME regex")
});

/// Month-day dates with optional year: "Mar 5", "March 5, 2024", "5 Mar 2024".
pub static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:([a-z]{3,9})\.?\s+(\d{1,2})(?:,?\s+(\d{4}))?|(\d{1,2})\s+([a-z]{3,9})\.?(?:\s+(\d{4}))?)$")
        .expect("MONTH_DAY regex")
});

/// Numeric dates: "2024-03-05", "3-5" (TikTok month-day).
pub static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d{4})-)?(\d{1,2})-(\d{1,2})$").expect("NUMERIC_DATE regex")
});

// =============================================================================
// Platform URL Shapes
// =============================================================================

/// Single tweet: `/<user>/status/<id>`.
pub static TWEET_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]{1,15})/status(?:es)?/(\d+)").expect("TWEET_PATH regex")
});

/// Single video: `/@<user>/video/<id>` (also `/photo/<id>` slideshows).
pub static TIKTOK_VIDEO_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/@([A-Za-z0-9_.]+)/(?:video|photo)/(\d+)").expect("TIKTOK_VIDEO_PATH regex")
});

/// Post or reel: `/p/<code>`, `/reel/<code>`, `/reels/<code>`, `/tv/<code>`.
pub static INSTAGRAM_MEDIA_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:[A-Za-z0-9_.]+/)?(p|reel|reels|tv)/([A-Za-z0-9_-]+)").expect("INSTAGRAM_MEDIA_PATH regex")
});

/// Story: `/stories/<user>/<id>`.
pub static INSTAGRAM_STORY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/stories/([A-Za-z0-9_.]+)(?:/(\d+))?").expect("INSTAGRAM_STORY_PATH regex")
});

/// Instagram `og:description`: "1,234 likes, 56 comments - user on March 5, 2024: "caption"".
pub static INSTAGRAM_OG_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)^\s*([\d.,]+[KMBkmb]?)\s+likes?,\s*([\d.,]+[KMBkmb]?)\s+comments?\s+-\s+([A-Za-z0-9_.]+)\s+on\s+([^:]+?):\s*"?(.*?)"?\.?\s*$"#,
    )
    .expect("INSTAGRAM_OG_SUMMARY regex")
});
