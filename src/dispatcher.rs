//! Strategy Dispatcher
//!
//! Picks the platform extractor for a page and runs it. Nothing escapes the
//! dispatcher as an error: a failed call becomes a placeholder item that
//! carries the failure kind and a readable reason.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dom::{self, Document};
use crate::error::Error;
use crate::host::PageHost;
use crate::options::{Options, SettingsOverrides};
use crate::platforms::{
    ExtractionStrategy, GenericExtractor, GenericStrategy, InstagramExtractor, InstagramStrategy, PlatformExtractor,
    TikTokExtractor, TikTokStrategy, TwitterExtractor, TwitterStrategy,
};
use crate::result::{ExtractedContent, Platform};
use crate::url_utils::canonical_page_key;

/// Remembered routes before the memo is cleared.
const MAX_ROUTES: usize = 1_024;

const PLATFORM_STRATEGIES: [&dyn ExtractionStrategy; 3] = [&TwitterStrategy, &TikTokStrategy, &InstagramStrategy];

/// The strategy for a parsed page: the first platform whose URL pattern and
/// indicators both match, else the generic one.
#[must_use]
pub fn detect_strategy(url: &str, doc: &Document) -> &'static dyn ExtractionStrategy {
    let scope = dom::document_scope(doc);
    PLATFORM_STRATEGIES
        .into_iter()
        .find(|strategy| strategy.matches_url(url) && strategy.indicators().matches(&scope))
        .unwrap_or(&GenericStrategy)
}

/// Result of one dispatched extraction.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The extracted item, or a placeholder when `error` is set.
    pub content: ExtractedContent,

    /// Platform whose extractor handled the page.
    pub platform: Platform,

    pub error: Option<Error>,
}

impl Dispatched {
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Routes pages to the platform extractors, with the generic extractor as
/// the catch-all.
///
/// All extractors are built up front and live as long as the dispatcher;
/// each keeps its own cache, session and observer.
pub struct StrategyDispatcher {
    platforms: Vec<Box<dyn PlatformExtractor>>,
    generic: GenericExtractor,

    /// Canonical page URL -> index into `platforms`. Platform matches only.
    routes: RefCell<HashMap<String, usize>>,
}

impl std::fmt::Debug for StrategyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyDispatcher")
            .field("platforms", &self.platforms.iter().map(|p| p.platform()).collect::<Vec<_>>())
            .field("routes", &self.routes.borrow().len())
            .finish_non_exhaustive()
    }
}

impl StrategyDispatcher {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        let platforms: Vec<Box<dyn PlatformExtractor>> = vec![
            Box::new(TwitterExtractor::new(TwitterStrategy, options)),
            Box::new(TikTokExtractor::new(TikTokStrategy, options)),
            Box::new(InstagramExtractor::new(InstagramStrategy, options)),
        ];
        Self {
            platforms,
            generic: GenericExtractor::new(GenericStrategy, options),
            routes: RefCell::new(HashMap::new()),
        }
    }

    /// The extractor for `platform`.
    #[must_use]
    pub fn extractor(&self, platform: Platform) -> &dyn PlatformExtractor {
        self.platforms
            .iter()
            .find(|p| p.platform() == platform)
            .map_or(&self.generic as &dyn PlatformExtractor, |p| p.as_ref())
    }

    /// Every extractor, generic last.
    pub fn extractors(&self) -> impl Iterator<Item = &dyn PlatformExtractor> {
        self.platforms
            .iter()
            .map(|p| p.as_ref())
            .chain(std::iter::once(&self.generic as &dyn PlatformExtractor))
    }

    /// Choose the extractor for the host's page.
    ///
    /// The first platform whose URL pattern and indicators both match wins;
    /// otherwise the generic extractor. Only platform matches are remembered
    /// per page: a page routed to the generic extractor is detected again on
    /// the next call, since its platform markup may not have rendered yet.
    pub async fn select(&self, host: &dyn PageHost) -> Result<&dyn PlatformExtractor, Error> {
        let url = host.url();
        let key = canonical_page_key(&url);
        let remembered = self.routes.borrow().get(&key).copied();
        let index = match remembered {
            Some(index) => Some(index),
            None => {
                let detected = self.detect(host, &url).await?;
                if let Some(index) = detected {
                    self.remember(key, index);
                }
                detected
            }
        };
        Ok(match index {
            Some(index) => self.platforms[index].as_ref(),
            None => &self.generic,
        })
    }

    fn remember(&self, key: String, index: usize) {
        let mut routes = self.routes.borrow_mut();
        if routes.len() >= MAX_ROUTES && !routes.contains_key(&key) {
            debug!(dropped = routes.len(), "route memo full, clearing");
            routes.clear();
        }
        routes.insert(key, index);
    }

    /// Pages with a remembered platform route.
    #[must_use]
    pub fn remembered_routes(&self) -> usize {
        self.routes.borrow().len()
    }

    async fn detect(&self, host: &dyn PageHost, url: &str) -> Result<Option<usize>, Error> {
        let html = host.snapshot().await?;
        let doc = dom::parse(&html);
        for (index, extractor) in self.platforms.iter().enumerate() {
            if extractor.can_handle(url, &doc) {
                debug!(platform = %extractor.platform(), url, "platform detected");
                return Ok(Some(index));
            }
        }
        debug!(url, "no platform matched, using generic extractor");
        Ok(None)
    }

    /// Extract the page's main item. Never fails: errors become placeholders.
    pub async fn dispatch(&self, host: &dyn PageHost) -> Dispatched {
        let url = host.url();
        let extractor = match self.select(host).await {
            Ok(extractor) => extractor,
            Err(err) => return Self::placeholder(Platform::Generic, &url, err),
        };
        let platform = extractor.platform();

        match extractor.extract_page_content(host).await {
            Ok(content) => Dispatched {
                content,
                platform,
                error: None,
            },
            Err(err) => Self::placeholder(platform, &url, err),
        }
    }

    /// Extract every usable item on the page; failures yield no items.
    pub async fn dispatch_items(&self, host: &dyn PageHost) -> Vec<ExtractedContent> {
        let extractor = match self.select(host).await {
            Ok(extractor) => extractor,
            Err(err) => {
                warn!(url = %host.url(), error = %err, "platform detection failed");
                return Vec::new();
            }
        };
        match extractor.extract_items(host).await {
            Ok(items) => items,
            Err(err) => {
                warn!(platform = %extractor.platform(), error = %err, "item extraction failed");
                Vec::new()
            }
        }
    }

    fn placeholder(platform: Platform, url: &str, err: Error) -> Dispatched {
        warn!(%platform, url, error = %err, kind = %err.kind(), "extraction failed, returning placeholder");
        Dispatched {
            content: ExtractedContent::placeholder(platform, Some(url), err.kind(), &err.to_string()),
            platform,
            error: Some(err),
        }
    }

    /// Apply host overrides to every extractor.
    pub fn apply_overrides(&self, overrides: &SettingsOverrides) {
        for extractor in self.extractors() {
            extractor.apply_overrides(overrides);
        }
    }

    /// Disconnect every observer subscription.
    pub fn stop_observing(&self) {
        for extractor in self.extractors() {
            extractor.stop_observing();
        }
    }

    /// Drop all per-extractor state and remembered routes.
    pub fn cleanup(&self) {
        for extractor in self.extractors() {
            extractor.cleanup();
        }
        self.routes.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::host::MemoryPage;
    use crate::result::ContentKind;

    const TWEET: &str = r#"<div data-testid="primaryColumn"><article data-testid="tweet">
        <div data-testid="User-Name"><a href="/jack" tabindex="-1"><span>@jack</span></a>
            <a href="/jack/status/20"><time datetime="2006-03-21T20:50:14.000Z">Mar 21</time></a></div>
        <div data-testid="tweetText" lang="en">just setting up my twttr</div>
    </article></div>"#;

    fn dispatcher() -> StrategyDispatcher {
        StrategyDispatcher::new(&Options::offline())
    }

    #[test]
    fn test_detect_strategy() {
        let doc = dom::parse(TWEET);
        assert_eq!(detect_strategy("https://x.com/jack/status/20", &doc).platform(), Platform::Twitter);
        assert_eq!(detect_strategy("https://example.com/jack/status/20", &doc).platform(), Platform::Generic);

        let bare = dom::parse("<html><body><p>hello</p></body></html>");
        assert_eq!(detect_strategy("https://www.tiktok.com/@a/video/1", &bare).platform(), Platform::Generic);
    }

    #[tokio::test]
    async fn test_routes_by_url_and_indicators() {
        let d = dispatcher();
        let page = MemoryPage::new("https://x.com/jack/status/20", TWEET);
        let out = d.dispatch(&page).await;
        assert!(!out.is_placeholder());
        assert_eq!(out.platform, Platform::Twitter);
        assert_eq!(out.content.id, "20");
    }

    #[tokio::test]
    async fn test_domain_without_indicators_goes_generic() {
        let d = dispatcher();
        let page = MemoryPage::new(
            "https://x.com/about",
            "<html><body><article><p>We are a company that builds things.</p></article></body></html>",
        );
        let out = d.dispatch(&page).await;
        assert_eq!(out.platform, Platform::Generic);
        assert_eq!(out.content.kind(), ContentKind::Article);
    }

    #[tokio::test]
    async fn test_failure_becomes_placeholder() {
        let d = dispatcher();
        let page = MemoryPage::new("https://x.com/jack/status/20", r#"<div data-testid="primaryColumn"></div>"#);
        let out = d.dispatch(&page).await;

        assert!(out.is_placeholder());
        assert_eq!(out.platform, Platform::Twitter);
        assert_eq!(out.content.metadata.confidence, 0.0);
        assert_eq!(out.content.metadata.failure, Some(ErrorKind::NoContentRoot));
        assert!(!out.content.metadata.errors.is_empty());
        assert!(!out.content.is_usable());
    }

    #[tokio::test]
    async fn test_late_rendering_page_is_detected_again() {
        let d = dispatcher();
        let page = MemoryPage::new(
            "https://x.com/jack/status/20",
            "<html><body><div id=\"react-root\"><p>Loading the app shell text here</p></div></body></html>",
        );
        let first = d.dispatch(&page).await;
        assert_eq!(first.platform, Platform::Generic);
        assert_eq!(d.remembered_routes(), 0);

        page.set_html(TWEET);
        let rendered = d.dispatch(&page).await;
        assert_eq!(rendered.platform, Platform::Twitter);
        assert_eq!(rendered.content.id, "20");
        assert_eq!(d.remembered_routes(), 1);
    }

    #[tokio::test]
    async fn test_route_memo_is_bounded() {
        let d = dispatcher();
        for id in 0..=MAX_ROUTES {
            let page = MemoryPage::new(format!("https://x.com/jack/status/{id}"), TWEET);
            assert_eq!(d.select(&page).await.unwrap().platform(), Platform::Twitter);
        }
        assert!(d.remembered_routes() <= MAX_ROUTES);
        assert!(d.remembered_routes() > 0);
    }

    #[tokio::test]
    async fn test_route_is_remembered() {
        let d = dispatcher();
        let page = MemoryPage::new("https://x.com/jack/status/20", TWEET);
        d.dispatch(&page).await;
        let after_first = page.snapshot_count();
        let again = d.dispatch(&page).await;
        assert_eq!(again.content.id, "20");
        assert_eq!(page.snapshot_count(), after_first);
    }
}
