//! # rs-social-extract
//!
//! Structured content extraction for social media pages.
//!
//! Given a page snapshot, the crate finds the platform's content roots and
//! turns tweets, threads, videos, posts, reels, stories and comments into one
//! normalized [`ExtractedContent`] shape: author, text, timestamp, engagement,
//! media, hashtags, mentions and replies, plus a confidence score and the
//! selectors that produced each field.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_social_extract::{extract_document, ContentKind, Options, Platform};
//!
//! let html = r#"<div data-testid="primaryColumn"><article data-testid="tweet">
//!   <div data-testid="User-Name"><a href="/jack" tabindex="-1"><span>@jack</span></a>
//!     <a href="/jack/status/20"><time datetime="2006-03-21T20:50:14.000Z">Mar 21</time></a></div>
//!   <div data-testid="tweetText" lang="en">just setting up my twttr</div>
//! </article></div>"#;
//!
//! let tweet = extract_document("https://x.com/jack/status/20", html, &Options::offline())?;
//! assert_eq!(tweet.platform, Platform::Twitter);
//! assert_eq!(tweet.kind(), ContentKind::Tweet);
//! assert_eq!(tweet.author.handle.as_deref(), Some("jack"));
//! # Ok::<(), rs_social_extract::Error>(())
//! ```
//!
//! ## Live pages
//!
//! Pages that keep changing are driven through a [`PageHost`]. The
//! [`StrategyDispatcher`] picks the platform extractor, which adds caching,
//! rate limiting, bounded retries, thread expansion and mutation observation
//! on top of the snapshot pass. [`ContentEngine`] connects the dispatcher to
//! an [`AnalysisService`] and an [`OverlaySink`].
//!
//! ## Features
//!
//! - **Platform strategies**: Twitter/X, TikTok and Instagram, with embedded
//!   data (rehydration blobs, JSON-LD, Open Graph) preferred over the DOM
//! - **Generic pages**: Readability (`readability` feature, on by default)
//! - **Selector fallback**: every field has an ordered list of selectors and
//!   records which one matched
//! - **Politeness**: per-platform minimum delays, session caps and backoff

mod error;
mod patterns;

/// Credibility service and overlay boundaries.
pub mod analysis;

/// TTL result cache with bulk eviction.
pub mod cache;

/// Confidence scoring for extracted items.
pub mod confidence;

/// Platform detection and failure-free dispatch.
pub mod dispatcher;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Decoders for data platforms embed in their pages.
pub mod embedded;

/// Host toggles, settings, analysis and rendering.
pub mod engine;

/// Field extractors shared by the platform strategies.
pub mod fields;

/// The page host boundary and an in-memory host.
pub mod host;

/// Debounced mutation observer.
pub mod observer;

/// Configuration and host setting overrides.
pub mod options;

/// "Show more" expansion of threads and comment lists.
pub mod pagination;

/// Platform strategies and the shared extractor machinery.
pub mod platforms;

/// The normalized content model.
pub mod result;

/// Ordered selector groups per platform.
pub mod selector;

/// Minimum delays, session caps and backoff.
pub mod throttle;

/// URL utilities for resolution, normalization and platform matching.
pub mod url_utils;

// Public API - re-exports
pub use analysis::{AnalysisRequest, AnalysisService, Credibility, CredibilityJudgment, OverlaySink};
pub use dispatcher::{Dispatched, StrategyDispatcher};
pub use engine::{ContentEngine, HostMessage};
pub use error::{Error, ErrorKind, Result};
pub use host::{MemoryPage, PageEvent, PageHost};
pub use options::{Options, SettingsOverrides};
pub use platforms::{ExtractionStrategy, PlatformExtractor};
pub use result::{
    Author, ContentKind, Engagement, ExtractedContent, ExtractionMetadata, KindDetails, MediaItem, Platform,
};

/// Extracts the main item of one page snapshot.
///
/// The platform is detected from the URL and the page's indicators; anything
/// unrecognized is read as a generic article. Replies present in the markup
/// are attached, but nothing is clicked, cached or throttled. Use a
/// [`StrategyDispatcher`] for live pages.
///
/// # Errors
///
/// Returns [`Error::Host`] when `url` does not parse and
/// [`Error::NoContentRoot`] when the page has no item to extract.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::{extract_document, ContentKind, Options};
///
/// let html = "<html><head><title>Notes</title></head><body><article><p>Short page.</p></article></body></html>";
/// let page = extract_document("https://example.org/notes", html, &Options::offline())?;
/// assert_eq!(page.kind(), ContentKind::Article);
/// # Ok::<(), rs_social_extract::Error>(())
/// ```
pub fn extract_document(url: &str, html: &str, options: &Options) -> Result<ExtractedContent> {
    let doc = dom::parse(html);
    let strategy = dispatcher::detect_strategy(url, &doc);
    let ctx = platforms::ExtractContext::new(strategy, url, chrono::Utc::now())?;
    platforms::extract_snapshot(strategy, &doc, &ctx, options)
}
