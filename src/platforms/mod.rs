//! Platform Extractors
//!
//! Every platform is described by an [`ExtractionStrategy`]: how to recognize
//! its pages, where its content roots are, how to read one item, and which
//! embedded blobs it ships. The strategy is pure and synchronous; it only ever
//! sees a parsed snapshot.
//!
//! [`StrategyExtractor`] wraps a strategy with the stateful machinery every
//! platform shares and implements the uniform [`PlatformExtractor`] contract:
//! result cache, session caps, minimum delays, bounded retries with backoff,
//! the extraction deadline, in-flight call coalescing, thread pagination and
//! the mutation observer. Each instance owns all of that state exclusively.

pub mod generic;
pub mod instagram;
pub mod tiktok;
pub mod twitter;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dom_query::Selection;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::ResultCache;
use crate::confidence;
use crate::dom::{self, Document};
use crate::embedded::{merge_with_dom, EmbeddedItem};
use crate::error::{Error, ErrorKind, Result};
use crate::fields::synthetic_id;
use crate::host::PageHost;
use crate::observer::DynamicContentObserver;
use crate::options::{Options, SettingsOverrides};
use crate::pagination::{paginate, PaginationControls};
use crate::result::{ContentKind, ExtractedContent, KindDetails, Platform};
use crate::selector::SelectorGroup;
use crate::throttle::{Backoff, DelayKind, DelayTable, RateLimiter, SessionLimits, SessionState};
use crate::url_utils::canonical_page_key;

pub use generic::{GenericExtractor, GenericStrategy};
pub use instagram::{InstagramExtractor, InstagramStrategy};
pub use tiktok::{TikTokExtractor, TikTokStrategy};
pub use twitter::{TwitterExtractor, TwitterStrategy};

// ============================================================
// PAGE MODEL
// ============================================================

/// Page sub-type, derived from the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageType {
    /// A single item (tweet, video, post, story). `id` comes from the URL.
    Item { kind: ContentKind, id: Option<String> },
    /// A feed, profile or search page listing many items.
    Timeline { kind: ContentKind },
}

impl PageType {
    /// Kind of the items the page shows.
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Item { kind, .. } | Self::Timeline { kind } => *kind,
        }
    }

    /// Item id carried by the URL.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Item { id, .. } => id.as_deref(),
            Self::Timeline { .. } => None,
        }
    }

    #[must_use]
    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item { .. })
    }
}

/// Per-call inputs shared by every field extractor.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub url: String,
    /// Base for resolving relative links and media.
    pub base: Url,
    pub page: PageType,
    /// Extraction time; relative timestamps resolve against it.
    pub now: DateTime<Utc>,
}

impl ExtractContext {
    /// Build the context for `url`. Fails on URLs that do not parse.
    pub fn new<S: ExtractionStrategy + ?Sized>(strategy: &S, url: &str, now: DateTime<Utc>) -> Result<Self> {
        let base = Url::parse(url).map_err(|e| Error::Host(format!("invalid page URL {url:?}: {e}")))?;
        Ok(Self {
            url: url.to_string(),
            base,
            page: strategy.page_type(url),
            now,
        })
    }
}

// ============================================================
// STRATEGY
// ============================================================

/// Synchronous, stateless description of one platform.
pub trait ExtractionStrategy {
    fn platform(&self) -> Platform;

    /// Whether the URL belongs to the platform (domain and path shape).
    fn matches_url(&self, url: &str) -> bool;

    /// Elements only the real platform client renders.
    fn indicators(&self) -> &'static SelectorGroup;

    fn page_type(&self, url: &str) -> PageType;

    /// Candidate content roots in document order. Nested candidates are
    /// discarded by the caller.
    fn content_roots<'a>(&self, doc: &'a Document, page: &PageType) -> Vec<Selection<'a>>;

    /// Platform id of the item under `root`, when the markup exposes it.
    fn item_id(&self, _root: &Selection, _ctx: &ExtractContext) -> Option<String> {
        None
    }

    /// DOM field extraction for one root. Field failures go to metadata.
    fn extract_item(&self, root: &Selection, ctx: &ExtractContext) -> ExtractedContent;

    /// Decode the page's embedded structured data, if the platform ships any.
    fn extract_embedded(&self, _doc: &Document, _ctx: &ExtractContext) -> Result<Option<EmbeddedItem>> {
        Ok(None)
    }

    /// Static per-session item caps.
    fn session_limits(&self) -> SessionLimits {
        SessionLimits::default()
    }

    /// "Show more" controls for replies or comments, when the platform has any.
    fn expansion(&self) -> Option<PaginationControls> {
        None
    }

    /// Replies, thread entries or comments visible in `doc` for the item page.
    fn extract_replies(&self, _doc: &Document, _ctx: &ExtractContext) -> Vec<ExtractedContent> {
        Vec::new()
    }
}

/// Drop roots nested inside another root (quoted tweets, embedded cards).
#[must_use]
pub fn outermost<'a>(roots: Vec<Selection<'a>>) -> Vec<Selection<'a>> {
    let ids: HashSet<_> = roots.iter().filter_map(dom::node_id).collect();
    roots
        .into_iter()
        .filter(|root| {
            !dom::ancestors(root)
                .iter()
                .filter_map(dom::node_id)
                .any(|id| ids.contains(&id))
        })
        .collect()
}

/// DOM pass for the page's main item.
///
/// On item pages the root whose id matches the URL wins; otherwise the first
/// root does. Without any root the call fails with [`Error::NoContentRoot`].
pub fn extract_dom<S: ExtractionStrategy + ?Sized>(
    strategy: &S,
    doc: &Document,
    ctx: &ExtractContext,
) -> Result<ExtractedContent> {
    let roots = outermost(strategy.content_roots(doc, &ctx.page));
    let root = ctx
        .page
        .id()
        .and_then(|id| roots.iter().find(|r| strategy.item_id(r, ctx).as_deref() == Some(id)))
        .or_else(|| roots.first())
        .ok_or(Error::NoContentRoot)?;

    let mut content = strategy.extract_item(root, ctx);
    if content.id.is_empty() {
        content.id = ctx
            .page
            .id()
            .map_or_else(|| synthetic_id(&content), str::to_string);
    }
    Ok(content)
}

/// Every usable item on the page, in document order.
#[must_use]
pub fn extract_all<S: ExtractionStrategy + ?Sized>(
    strategy: &S,
    doc: &Document,
    ctx: &ExtractContext,
) -> Vec<ExtractedContent> {
    outermost(strategy.content_roots(doc, &ctx.page))
        .iter()
        .map(|root| {
            let mut item = strategy.extract_item(root, ctx);
            if item.id.is_empty() {
                item.id = synthetic_id(&item);
            }
            item
        })
        .filter(ExtractedContent::is_usable)
        .collect()
}

/// Extract the main item of a parsed page.
///
/// Embedded data is tried first. A result scoring at least the configured
/// threshold is returned as is; a weaker one is completed from the DOM
/// (`hybrid`). Undecodable embedded data is noted and the DOM pass runs alone.
pub fn extract_from_document<S: ExtractionStrategy + ?Sized>(
    strategy: &S,
    doc: &Document,
    ctx: &ExtractContext,
    options: &Options,
) -> Result<ExtractedContent> {
    let platform = strategy.platform();
    let embedded = if options.features.use_embedded_data && ctx.page.is_item() {
        strategy.extract_embedded(doc, ctx)
    } else {
        Ok(None)
    };

    match embedded {
        Ok(Some(item)) => {
            let source = item.source.clone();
            let mut content = item.into_content(platform, ctx.page.id().unwrap_or_default());
            let score = confidence::assign(&mut content, &options.confidence);
            if score >= options.embedded_confidence_threshold && content.is_usable() {
                if content.id.is_empty() {
                    content.id = synthetic_id(&content);
                }
                debug!(%platform, %source, score, "embedded data sufficient");
                return Ok(content);
            }

            debug!(%platform, %source, score, "embedded data below threshold, merging with DOM");
            match extract_dom(strategy, doc, ctx) {
                Ok(dom_content) => merge_with_dom(&mut content, dom_content),
                Err(err) if content.is_usable() => content.note_error(err.to_string()),
                Err(err) => return Err(err),
            }
            if content.id.is_empty() {
                content.id = synthetic_id(&content);
            }
            Ok(content)
        }
        Ok(None) => extract_dom(strategy, doc, ctx),
        Err(err) => {
            warn!(%platform, error = %err, "embedded data unusable, falling back to DOM");
            let mut content = extract_dom(strategy, doc, ctx)?;
            content.note_error(err.to_string());
            Ok(content)
        }
    }
}

/// Cap, renumber and score replies, then attach them to `content`.
fn attach_replies(content: &mut ExtractedContent, mut replies: Vec<ExtractedContent>, options: &Options) {
    replies.truncate(options.max_replies);
    for (position, reply) in replies.iter_mut().enumerate() {
        if let KindDetails::ThreadEntry { position: slot, .. } = &mut reply.details {
            *slot = position;
        }
        confidence::assign(reply, &options.confidence);
    }
    content.replies = replies;
}

/// Extract a parsed snapshot in one synchronous pass: main item, the replies
/// already on the page, and confidence. No throttling, caching or expansion.
pub fn extract_snapshot<S: ExtractionStrategy + ?Sized>(
    strategy: &S,
    doc: &Document,
    ctx: &ExtractContext,
    options: &Options,
) -> Result<ExtractedContent> {
    let mut content = extract_from_document(strategy, doc, ctx, options)?;
    let replies = if ctx.page.is_item() {
        strategy.extract_replies(doc, ctx)
    } else {
        Vec::new()
    };
    attach_replies(&mut content, replies, options);
    confidence::assign(&mut content, &options.confidence);
    content.metadata.extracted_at = Some(ctx.now);
    Ok(content)
}

// ============================================================
// UNIFORM CONTRACT
// ============================================================

/// Lifecycle of the most recent extraction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionPhase {
    #[default]
    Idle,
    Extracting,
    Succeeded,
    Failed,
}

/// Uniform per-platform extractor contract.
#[async_trait(?Send)]
pub trait PlatformExtractor {
    fn platform(&self) -> Platform;

    /// True only when the URL matches the platform *and* the document holds
    /// at least one platform indicator.
    fn can_handle(&self, url: &str, doc: &Document) -> bool;

    /// Extract the page's main item (the first item on timelines).
    async fn extract_page_content(&self, host: &dyn PageHost) -> Result<ExtractedContent>;

    /// Extract every usable item currently on the page.
    async fn extract_items(&self, host: &dyn PageHost) -> Result<Vec<ExtractedContent>>;

    /// Subscribe to page changes. `initial` items are marked as processed.
    /// Returns `false` when mutation observation is disabled.
    fn start_observing(&self, host: &dyn PageHost, initial: &[ExtractedContent]) -> bool;

    /// Wait for the next debounced burst of changes and return the items it
    /// revealed. `None` once observation stopped or the host closed the stream.
    async fn next_new_items(&self, host: &dyn PageHost) -> Option<Vec<ExtractedContent>>;

    /// Dispose the observer subscription. Safe to call repeatedly.
    fn stop_observing(&self);

    fn is_observing(&self) -> bool;

    fn phase(&self) -> ExtractionPhase;

    /// Apply host rate-limit and feature overrides.
    fn apply_overrides(&self, overrides: &SettingsOverrides);

    /// Stop observing and drop cache and session state.
    fn cleanup(&self);
}

type Outcome = watch::Receiver<Option<Result<ExtractedContent>>>;

/// [`PlatformExtractor`] built from a strategy and the shared machinery.
#[derive(Debug)]
pub struct StrategyExtractor<S> {
    strategy: S,
    options: RefCell<Options>,
    cache: RefCell<ResultCache>,
    session: RefCell<SessionState>,
    limiter: RateLimiter,
    observer: RefCell<Option<DynamicContentObserver>>,
    observer_generation: Cell<u64>,
    phase: Cell<ExtractionPhase>,
    /// Cache key -> (call number, outcome channel) of running extractions.
    in_flight: RefCell<HashMap<String, (u64, Outcome)>>,
    calls: Cell<u64>,
}

impl<S: ExtractionStrategy> StrategyExtractor<S> {
    #[must_use]
    pub fn new(strategy: S, options: &Options) -> Self {
        Self {
            strategy,
            options: RefCell::new(options.clone()),
            cache: RefCell::new(ResultCache::new(&options.cache)),
            session: RefCell::new(SessionState::new(options.throttle.session_duration())),
            limiter: RateLimiter::new(&options.throttle),
            observer: RefCell::new(None),
            observer_generation: Cell::new(0),
            phase: Cell::new(ExtractionPhase::Idle),
            in_flight: RefCell::new(HashMap::new()),
            calls: Cell::new(0),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Current effective options.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options.borrow().clone()
    }

    /// Copy of the session state.
    #[must_use]
    pub fn session(&self) -> SessionState {
        self.session.borrow().clone()
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Cache key: platform id when the URL carries one, else the canonical URL.
    fn cache_key(&self, url: &str) -> String {
        match self.strategy.page_type(url).id() {
            Some(id) => format!("{}:{id}", self.strategy.platform()),
            None => canonical_page_key(url),
        }
    }

    fn check_compliance(&self, host: &dyn PageHost, options: &Options) -> Result<()> {
        if options.features.respect_tracking_preference && host.do_not_track() {
            self.session.borrow_mut().record_error(ErrorKind::ComplianceBlocked);
            info!(platform = %self.strategy.platform(), "tracking preference set, not extracting");
            return Err(Error::ComplianceBlocked {
                reason: "the visitor's tracking preference forbids extraction".to_string(),
            });
        }
        Ok(())
    }

    fn check_session(&self, kind: ContentKind, options: &Options) -> Result<()> {
        let mut session = self.session.borrow_mut();
        session.reset_if_expired(Instant::now());
        let decision = session.check(kind, &self.strategy.session_limits(), options.throttle.session_cap_override);
        if decision.allowed {
            return Ok(());
        }
        session.record_error(ErrorKind::RateLimitExceeded);
        let reason = decision.reason.unwrap_or_else(|| "session cap reached".to_string());
        warn!(platform = %self.strategy.platform(), %kind, %reason, "rate limit denied extraction");
        Err(Error::RateLimitExceeded { reason })
    }

    /// One full extraction call: compliance, cache, session, then the
    /// bounded retry loop.
    async fn run(&self, host: &dyn PageHost, key: &str) -> Result<ExtractedContent> {
        let options = self.options.borrow().clone();
        let platform = self.strategy.platform();
        let url = host.url();

        self.check_compliance(host, &options)?;

        let cached = self.cache.borrow_mut().get(key);
        if let Some(hit) = cached {
            debug!(%platform, key, "cache hit");
            return Ok(hit);
        }
        debug!(%platform, key, "cache miss");

        let page = self.strategy.page_type(&url);
        self.check_session(page.kind(), &options)?;

        // Validate the URL once, outside the retry loop.
        ExtractContext::new(&self.strategy, &url, Utc::now())?;

        let backoff = Backoff::from_options(&options.throttle);
        let deadline = options.throttle.extraction_timeout();
        let started = Instant::now();
        let mut attempt: u32 = 1;

        let mut content = loop {
            let gate = if attempt == 1 { DelayKind::BetweenItems } else { DelayKind::AfterError };
            self.limiter.wait(gate).await;

            let ctx = ExtractContext::new(&self.strategy, &url, Utc::now())?;
            let outcome = match timeout(deadline, self.attempt(host, &ctx, &options)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(%platform, attempt, timeout_ms = options.throttle.extraction_timeout_ms, "extraction timed out");
                    Err(Error::ExtractionTimeout(options.throttle.extraction_timeout_ms))
                }
            };

            match outcome {
                Ok(content) => break content,
                Err(err) => {
                    self.session.borrow_mut().record_error(err.kind());
                    if err.is_retryable() && backoff.should_retry(attempt) {
                        let delay = backoff.delay(attempt);
                        self.session.borrow_mut().retry_count += 1;
                        warn!(
                            %platform,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "extraction attempt failed, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    warn!(%platform, attempt, error = %err, "extraction failed");
                    return Err(err);
                }
            }
        };

        confidence::assign(&mut content, &options.confidence);
        content.metadata.extraction_ms = started.elapsed().as_millis() as u64;
        content.metadata.extracted_at = Some(Utc::now());
        self.session.borrow_mut().record_item(content.kind(), Instant::now());
        let replies = std::mem::take(&mut content.replies);
        content.replies = self.admit(replies, &options);

        if content.is_usable() {
            self.cache.borrow_mut().insert(key, content.clone());
        } else {
            debug!(%platform, key, "empty item not cached");
        }

        info!(
            %platform,
            url = %url,
            id = %content.id,
            kind = %content.kind(),
            confidence = content.metadata.confidence,
            elapsed_ms = content.metadata.extraction_ms,
            replies = content.replies.len(),
            "extracted"
        );
        Ok(content)
    }

    /// A single attempt, raced against the deadline by the caller.
    async fn attempt(&self, host: &dyn PageHost, ctx: &ExtractContext, options: &Options) -> Result<ExtractedContent> {
        let html = host.snapshot().await?;
        let (mut content, mut replies) = {
            let doc = dom::parse(&html);
            let content = extract_from_document(&self.strategy, &doc, ctx, options)?;
            let replies = if ctx.page.is_item() {
                self.strategy.extract_replies(&doc, ctx)
            } else {
                Vec::new()
            };
            (content, replies)
        };

        if options.features.expand_threads && ctx.page.is_item() {
            if let Some(controls) = self.strategy.expansion() {
                let outcome = paginate(host, controls, &options.pagination, &self.limiter, &mut replies, |doc| {
                    self.strategy.extract_replies(doc, ctx)
                })
                .await;
                match outcome {
                    Ok(report) => debug!(
                        platform = %self.strategy.platform(),
                        iterations = report.iterations,
                        added = report.added,
                        stop = ?report.stop,
                        "thread expanded"
                    ),
                    Err(err) => content.note_error(format!("pagination: {err}")),
                }
            }
        }

        attach_replies(&mut content, replies, options);
        Ok(content)
    }

    /// Snapshot the page and extract every usable item. No session accounting.
    async fn collect_items(&self, host: &dyn PageHost, options: &Options) -> Result<Vec<ExtractedContent>> {
        let url = host.url();
        let ctx = ExtractContext::new(&self.strategy, &url, Utc::now())?;
        self.limiter.wait(DelayKind::BetweenItems).await;
        let html = host.snapshot().await?;

        let doc = dom::parse(&html);
        let mut items = extract_all(&self.strategy, &doc, &ctx);
        for item in &mut items {
            confidence::assign(item, &options.confidence);
            item.metadata.extracted_at = Some(ctx.now);
        }
        debug!(platform = %self.strategy.platform(), count = items.len(), "extracted page items");
        Ok(items)
    }

    /// Apply session caps to items, counting the admitted ones. Items over
    /// their kind's cap are dropped.
    fn admit(&self, items: Vec<ExtractedContent>, options: &Options) -> Vec<ExtractedContent> {
        let limits = self.strategy.session_limits();
        let mut session = self.session.borrow_mut();
        session.reset_if_expired(Instant::now());
        let mut admitted = Vec::with_capacity(items.len());
        for item in items {
            let decision = session.check(item.kind(), &limits, options.throttle.session_cap_override);
            if !decision.allowed {
                session.record_error(ErrorKind::RateLimitExceeded);
                debug!(kind = %item.kind(), reason = ?decision.reason, "item over session cap, dropped");
                continue;
            }
            session.record_item(item.kind(), Instant::now());
            admitted.push(item);
        }
        admitted
    }
}

#[async_trait(?Send)]
impl<S: ExtractionStrategy> PlatformExtractor for StrategyExtractor<S> {
    fn platform(&self) -> Platform {
        self.strategy.platform()
    }

    fn can_handle(&self, url: &str, doc: &Document) -> bool {
        self.strategy.matches_url(url) && self.strategy.indicators().matches(&dom::document_scope(doc))
    }

    async fn extract_page_content(&self, host: &dyn PageHost) -> Result<ExtractedContent> {
        let url = host.url();
        let key = self.cache_key(&url);

        let joined = self.in_flight.borrow().get(&key).map(|(_, rx)| rx.clone());
        if let Some(mut rx) = joined {
            let cached = self.cache.borrow_mut().get(&key);
            if let Some(hit) = cached {
                debug!(%key, "serving cache while an extraction is in flight");
                return Ok(hit);
            }
            debug!(%key, "joining in-flight extraction");
            let outcome = rx.wait_for(Option::is_some).await.map(|value| (*value).clone());
            if let Ok(Some(result)) = outcome {
                return result;
            }
        }

        let call = self.calls.get() + 1;
        self.calls.set(call);
        let (tx, rx) = watch::channel(None);
        self.in_flight.borrow_mut().insert(key.clone(), (call, rx));
        self.phase.set(ExtractionPhase::Extracting);

        let result = self.run(host, &key).await;

        tx.send_replace(Some(result.clone()));
        drop(tx);
        let still_running = {
            let mut in_flight = self.in_flight.borrow_mut();
            if in_flight.get(&key).is_some_and(|(owner, _)| *owner == call) {
                in_flight.remove(&key);
            }
            // Entries of abandoned calls have lost their sender.
            in_flight.retain(|_, (_, rx)| rx.has_changed().is_ok());
            !in_flight.is_empty()
        };
        self.phase.set(if still_running {
            ExtractionPhase::Extracting
        } else if result.is_ok() {
            ExtractionPhase::Succeeded
        } else {
            ExtractionPhase::Failed
        });
        result
    }

    async fn extract_items(&self, host: &dyn PageHost) -> Result<Vec<ExtractedContent>> {
        let options = self.options.borrow().clone();
        self.check_compliance(host, &options)?;
        let page = self.strategy.page_type(&host.url());
        self.check_session(page.kind(), &options)?;

        let items = self.collect_items(host, &options).await?;
        Ok(self.admit(items, &options))
    }

    fn start_observing(&self, host: &dyn PageHost, initial: &[ExtractedContent]) -> bool {
        let options = self.options.borrow().clone();
        if !options.features.observe_mutations {
            debug!(platform = %self.strategy.platform(), "mutation observation disabled");
            return false;
        }
        self.stop_observing();

        let mut observer = DynamicContentObserver::new(options.observer);
        observer.attach(host);
        for item in initial {
            observer.mark_processed(item);
        }
        *self.observer.borrow_mut() = Some(observer);
        true
    }

    async fn next_new_items(&self, host: &dyn PageHost) -> Option<Vec<ExtractedContent>> {
        let generation = self.observer_generation.get();
        let mut observer = self.observer.borrow_mut().take()?;

        let Some(batch) = observer.next_batch().await else {
            observer.disconnect();
            return None;
        };
        if self.observer_generation.get() != generation {
            observer.disconnect();
            return None;
        }

        let options = self.options.borrow().clone();
        let collected = match self.check_compliance(host, &options) {
            Ok(()) => self.collect_items(host, &options).await,
            Err(err) => Err(err),
        };
        let items = match collected {
            Ok(items) => items,
            Err(err) => {
                warn!(platform = %self.strategy.platform(), error = %err, "re-extraction after mutations failed");
                Vec::new()
            }
        };
        if self.observer_generation.get() != generation {
            observer.disconnect();
            return None;
        }

        let fresh = observer.filter_unprocessed(items);
        *self.observer.borrow_mut() = Some(observer);

        let fresh = self.admit(fresh, &options);
        debug!(
            platform = %self.strategy.platform(),
            mutations = batch.mutations,
            visibility = batch.visibility,
            new_items = fresh.len(),
            "observer pass"
        );
        Some(fresh)
    }

    fn stop_observing(&self) {
        self.observer_generation.set(self.observer_generation.get() + 1);
        if let Some(mut observer) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
    }

    fn is_observing(&self) -> bool {
        self.observer.borrow().as_ref().is_some_and(DynamicContentObserver::is_attached)
    }

    fn phase(&self) -> ExtractionPhase {
        self.phase.get()
    }

    fn apply_overrides(&self, overrides: &SettingsOverrides) {
        let mut options = self.options.borrow_mut();
        options.apply_overrides(overrides);
        self.limiter.set_delays(DelayTable::from_options(&options.throttle));
        debug!(platform = %self.strategy.platform(), ?overrides, "settings overrides applied");
    }

    fn cleanup(&self) {
        self.stop_observing();
        self.cache.borrow_mut().clear();
        self.session.borrow_mut().reset();
        self.in_flight.borrow_mut().clear();
        self.phase.set(ExtractionPhase::Idle);
        debug!(platform = %self.strategy.platform(), "extractor cleaned up");
    }
}
