//! Dynamic Content Observer
//!
//! Watches the page for content that appears after the first extraction pass.
//! Change notifications arrive through a [`Subscription`]; relevant ones are
//! coalesced by a trailing debounce so a burst of mutations yields a single
//! [`ObserverBatch`], and therefore a single re-extraction pass.
//!
//! Items already handed downstream are remembered by content identity (the
//! platform id, or a text fingerprint when the page exposes none). Snapshots
//! are re-parsed on every pass, so node identity does not survive between
//! passes; content identity does.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::host::{MutationKind, PageEvent, PageHost, Subscription};
use crate::options::ObserverOptions;
use crate::result::ExtractedContent;

/// Coalesced notifications that warrant one re-extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverBatch {
    /// Relevant mutations folded into this batch.
    pub mutations: usize,
    /// Elements that became visible.
    pub visibility: usize,
    /// Notifications ignored by the attribute filter.
    pub ignored: usize,
}

/// Debounced page observer owning its subscription.
#[derive(Debug)]
pub struct DynamicContentObserver {
    options: ObserverOptions,
    subscription: Option<Subscription>,
    processed: HashSet<String>,
    processed_order: VecDeque<String>,
    passes: usize,
}

impl DynamicContentObserver {
    #[must_use]
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            subscription: None,
            processed: HashSet::new(),
            processed_order: VecDeque::new(),
            passes: 0,
        }
    }

    /// Subscribe to `host`, replacing any earlier subscription.
    pub fn attach(&mut self, host: &dyn PageHost) {
        self.disconnect();
        self.subscription = Some(host.subscribe());
        debug!(url = %host.url(), "observer attached");
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether a notification should trigger re-extraction.
    ///
    /// Structural and text changes always count; attribute changes count only
    /// for allow-listed attributes; visibility counts when an element appears.
    #[must_use]
    pub fn is_relevant(&self, event: &PageEvent) -> bool {
        match event {
            PageEvent::Mutation {
                kind: MutationKind::ChildList | MutationKind::CharacterData,
                ..
            } => true,
            PageEvent::Mutation {
                kind: MutationKind::Attributes,
                attribute,
            } => attribute
                .as_deref()
                .is_some_and(|name| self.options.attribute_allow_list.iter().any(|a| a == name)),
            PageEvent::Visibility { visible, .. } => *visible,
        }
    }

    /// Wait for the next burst of relevant notifications.
    ///
    /// Blocks until a relevant notification arrives, then keeps collecting
    /// until the page has been quiet for the debounce delay (capped at four
    /// debounce delays after the first notification). Returns `None` when
    /// detached or when the host closed the stream before anything relevant
    /// arrived.
    pub async fn next_batch(&mut self) -> Option<ObserverBatch> {
        let debounce = self.options.debounce();
        let mut batch = ObserverBatch::default();

        loop {
            let event = self.subscription.as_mut()?.recv().await?;
            if self.count(&event, &mut batch) {
                break;
            }
        }

        let hard_deadline = Instant::now() + debounce * 4;
        let mut deadline = (Instant::now() + debounce).min(hard_deadline);

        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                break;
            };
            match timeout_at(deadline, subscription.recv()).await {
                Ok(Some(event)) => {
                    if self.count(&event, &mut batch) {
                        deadline = (Instant::now() + debounce).min(hard_deadline);
                    }
                }
                Ok(None) => {
                    trace!("event stream closed during debounce");
                    break;
                }
                Err(_) => break,
            }
        }

        self.passes += 1;
        debug!(
            pass = self.passes,
            mutations = batch.mutations,
            visibility = batch.visibility,
            ignored = batch.ignored,
            "observer pass"
        );
        Some(batch)
    }

    fn count(&self, event: &PageEvent, batch: &mut ObserverBatch) -> bool {
        if !self.is_relevant(event) {
            batch.ignored += 1;
            return false;
        }
        match event {
            PageEvent::Mutation { .. } => batch.mutations += 1,
            PageEvent::Visibility { .. } => batch.visibility += 1,
        }
        true
    }

    /// Keep only items not seen before, and remember them.
    pub fn filter_unprocessed(&mut self, items: Vec<ExtractedContent>) -> Vec<ExtractedContent> {
        let mut fresh = Vec::new();
        for item in items {
            let key = content_key(&item);
            if self.processed.contains(&key) {
                continue;
            }
            self.remember(key);
            fresh.push(item);
        }
        fresh
    }

    /// Mark an item as processed without filtering.
    pub fn mark_processed(&mut self, item: &ExtractedContent) {
        let key = content_key(item);
        if !self.processed.contains(&key) {
            self.remember(key);
        }
    }

    fn remember(&mut self, key: String) {
        self.processed.insert(key.clone());
        self.processed_order.push_back(key);
        while self.processed_order.len() > self.options.max_tracked.max(1) {
            if let Some(oldest) = self.processed_order.pop_front() {
                self.processed.remove(&oldest);
            }
        }
    }

    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Number of batches delivered so far.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Drop the subscription. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose();
            debug!("observer disconnected");
        }
    }

    /// Disconnect and forget processed items.
    pub fn reset(&mut self) {
        self.disconnect();
        self.processed.clear();
        self.processed_order.clear();
        self.passes = 0;
    }
}

/// Identity of an item across passes: `platform:id`, or a fingerprint of
/// author and text when the id is empty.
#[must_use]
pub fn content_key(item: &ExtractedContent) -> String {
    if !item.id.is_empty() {
        return format!("{}:{}", item.platform, item.id);
    }
    let mut hasher = DefaultHasher::new();
    item.author.handle.hash(&mut hasher);
    item.text.hash(&mut hasher);
    format!("{}:text:{:016x}", item.platform, hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPage;
    use crate::result::{ContentKind, Platform};
    use std::time::Duration;

    fn item(id: &str, text: &str) -> ExtractedContent {
        let mut content = ExtractedContent::new(Platform::Twitter, ContentKind::Tweet, id);
        content.text = text.to_string();
        content
    }

    #[test]
    fn test_attribute_allow_list() {
        let observer = DynamicContentObserver::new(ObserverOptions::default());
        assert!(observer.is_relevant(&PageEvent::child_list()));
        assert!(observer.is_relevant(&PageEvent::attribute("class")));
        assert!(!observer.is_relevant(&PageEvent::attribute("data-scroll-offset")));
        assert!(observer.is_relevant(&PageEvent::visible("img")));
        assert!(!observer.is_relevant(&PageEvent::Visibility {
            target: "img".into(),
            visible: false
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_one_batch() {
        let page = MemoryPage::new("https://x.com/home", "<main></main>");
        let mut observer = DynamicContentObserver::new(ObserverOptions::default());
        observer.attach(&page);

        for _ in 0..50 {
            page.emit(&PageEvent::child_list());
        }
        page.emit(&PageEvent::attribute("data-scroll-offset"));

        let start = Instant::now();
        let batch = observer.next_batch().await.unwrap();
        assert_eq!(batch.mutations, 50);
        assert_eq!(batch.ignored, 1);
        assert_eq!(Instant::now() - start, Duration::from_millis(500));
        assert_eq!(observer.passes(), 1);

        page.close_events();
        assert!(observer.next_batch().await.is_none());
        assert_eq!(observer.passes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_irrelevant_events_never_trigger() {
        let page = MemoryPage::new("https://x.com/home", "<main></main>");
        let mut observer = DynamicContentObserver::new(ObserverOptions::default());
        observer.attach(&page);

        page.emit(&PageEvent::attribute("data-scroll-offset"));
        page.close_events();
        assert!(observer.next_batch().await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_releases_subscription() {
        let page = MemoryPage::new("https://x.com/home", "<main></main>");
        let mut observer = DynamicContentObserver::new(ObserverOptions::default());
        observer.attach(&page);
        assert_eq!(page.active_subscriptions(), 1);

        observer.attach(&page);
        assert_eq!(page.active_subscriptions(), 1);

        observer.disconnect();
        observer.disconnect();
        assert_eq!(page.active_subscriptions(), 0);
        assert!(!observer.is_attached());
        assert!(observer.next_batch().await.is_none());
    }

    #[test]
    fn test_filter_unprocessed() {
        let mut observer = DynamicContentObserver::new(ObserverOptions::default());
        let first = observer.filter_unprocessed(vec![item("1", "a"), item("2", "b")]);
        assert_eq!(first.len(), 2);

        let second = observer.filter_unprocessed(vec![item("2", "b"), item("3", "c")]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "3");
    }

    #[test]
    fn test_items_without_id_use_fingerprint() {
        let mut observer = DynamicContentObserver::new(ObserverOptions::default());
        assert_eq!(observer.filter_unprocessed(vec![item("", "same"), item("", "same")]).len(), 1);
        assert_eq!(observer.filter_unprocessed(vec![item("", "different")]).len(), 1);
    }

    #[test]
    fn test_processed_set_is_bounded() {
        let options = ObserverOptions {
            max_tracked: 2,
            ..ObserverOptions::default()
        };
        let mut observer = DynamicContentObserver::new(options);
        observer.filter_unprocessed(vec![item("1", "a"), item("2", "b"), item("3", "c")]);
        assert_eq!(observer.processed_count(), 2);
        assert_eq!(observer.filter_unprocessed(vec![item("1", "a")]).len(), 1);
    }
}
