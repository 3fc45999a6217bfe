//! Live page boundary.
//!
//! The engine never owns a browser. Everything it needs from the live page
//! goes through [`PageHost`]: the current URL, a serialized snapshot of the
//! document, simulated clicks, the visitor's tracking preference, and a stream
//! of change notifications. Notifications are delivered through a
//! [`Subscription`], an owned handle that unsubscribes when disposed or
//! dropped.
//!
//! [`MemoryPage`] is an in-memory host for tests, benches and the CLI.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::dom;
use crate::error::{Error, Result};

/// Kind of structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Nodes added or removed.
    ChildList,
    /// An attribute changed.
    Attributes,
    /// Text content changed.
    CharacterData,
}

/// A change notification from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Mutation {
        kind: MutationKind,
        /// Changed attribute, for [`MutationKind::Attributes`].
        attribute: Option<String>,
    },
    /// An observed element entered or left the viewport.
    Visibility {
        /// Selector identifying the element.
        target: String,
        visible: bool,
    },
}

impl PageEvent {
    /// Child-list mutation.
    #[must_use]
    pub fn child_list() -> Self {
        Self::Mutation {
            kind: MutationKind::ChildList,
            attribute: None,
        }
    }

    /// Attribute mutation.
    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Mutation {
            kind: MutationKind::Attributes,
            attribute: Some(name.into()),
        }
    }

    /// Element became visible.
    #[must_use]
    pub fn visible(target: impl Into<String>) -> Self {
        Self::Visibility {
            target: target.into(),
            visible: true,
        }
    }
}

/// Owned change-notification subscription.
///
/// Dropping the handle unsubscribes; [`Subscription::dispose`] does so
/// explicitly. The host notices on its next delivery attempt.
#[derive(Debug)]
pub struct Subscription {
    events: UnboundedReceiver<PageEvent>,
}

impl Subscription {
    /// Create a subscription pair: the host keeps the sender.
    #[must_use]
    pub fn channel() -> (UnboundedSender<PageEvent>, Self) {
        let (tx, rx) = unbounded_channel();
        (tx, Self { events: rx })
    }

    /// Next event, or `None` once the host closed the stream.
    pub async fn recv(&mut self) -> Option<PageEvent> {
        self.events.recv().await
    }

    /// Stop receiving events.
    pub fn dispose(mut self) {
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.events.close();
    }
}

/// Access to the live page.
#[async_trait(?Send)]
pub trait PageHost {
    /// Current page URL.
    fn url(&self) -> String;

    /// Serialized HTML of the current document.
    async fn snapshot(&self) -> Result<String>;

    /// Click the first element matching `selector`. `Ok(false)` when nothing
    /// matched.
    async fn click(&self, selector: &str) -> Result<bool>;

    /// The visitor's tracking preference (Do-Not-Track / Global Privacy Control).
    fn do_not_track(&self) -> bool {
        false
    }

    /// Subscribe to mutation and visibility notifications.
    fn subscribe(&self) -> Subscription;
}

/// In-memory [`PageHost`].
///
/// Clicks can be scripted per selector: each click on a scripted selector
/// replaces the document with the next queued sequence of states, one state
/// per subsequent snapshot (e.g. a loading state followed by the loaded one).
#[derive(Debug)]
pub struct MemoryPage {
    url: String,
    html: RefCell<String>,
    pending_states: RefCell<VecDeque<String>>,
    scripted_clicks: RefCell<HashMap<String, VecDeque<Vec<String>>>>,
    clicks: RefCell<Vec<String>>,
    snapshots: Cell<usize>,
    failing_snapshots: Cell<usize>,
    snapshot_delay: Cell<Duration>,
    do_not_track: Cell<bool>,
    subscribers: RefCell<Vec<UnboundedSender<PageEvent>>>,
}

impl MemoryPage {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: RefCell::new(html.into()),
            pending_states: RefCell::new(VecDeque::new()),
            scripted_clicks: RefCell::new(HashMap::new()),
            clicks: RefCell::new(Vec::new()),
            snapshots: Cell::new(0),
            failing_snapshots: Cell::new(0),
            snapshot_delay: Cell::new(Duration::ZERO),
            do_not_track: Cell::new(false),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Replace the document.
    pub fn set_html(&self, html: impl Into<String>) {
        self.pending_states.borrow_mut().clear();
        *self.html.borrow_mut() = html.into();
    }

    /// Script the next click on `selector`: the document goes through `states`,
    /// advancing one state per snapshot.
    pub fn on_click(&self, selector: impl Into<String>, states: Vec<String>) {
        self.scripted_clicks
            .borrow_mut()
            .entry(selector.into())
            .or_default()
            .push_back(states);
    }

    /// Make the next `count` snapshots fail with a host error.
    pub fn fail_snapshots(&self, count: usize) {
        self.failing_snapshots.set(count);
    }

    /// Delay every snapshot by `delay`.
    pub fn set_snapshot_delay(&self, delay: Duration) {
        self.snapshot_delay.set(delay);
    }

    pub fn set_do_not_track(&self, value: bool) {
        self.do_not_track.set(value);
    }

    /// Deliver `event` to every live subscription, pruning disposed ones.
    pub fn emit(&self, event: &PageEvent) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// End every subscription's event stream.
    pub fn close_events(&self) {
        self.subscribers.borrow_mut().clear();
    }

    /// Subscriptions not yet disposed.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.borrow().iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Number of snapshots served (successful or not).
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.get()
    }

    /// Selectors clicked so far, in order.
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    /// Current document without counting as a snapshot.
    #[must_use]
    pub fn html(&self) -> String {
        self.html.borrow().clone()
    }
}

#[async_trait(?Send)]
impl PageHost for MemoryPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn snapshot(&self) -> Result<String> {
        self.snapshots.set(self.snapshots.get() + 1);

        let delay = self.snapshot_delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self.failing_snapshots.get();
        if failing > 0 {
            self.failing_snapshots.set(failing - 1);
            return Err(Error::Host("snapshot unavailable".to_string()));
        }

        let current = self.html.borrow().clone();
        if let Some(next) = self.pending_states.borrow_mut().pop_front() {
            *self.html.borrow_mut() = next;
        }
        Ok(current)
    }

    async fn click(&self, selector: &str) -> Result<bool> {
        let present = {
            let doc = dom::parse(&self.html.borrow());
            dom::has_match(&dom::document_scope(&doc), selector)
        };
        if !present {
            return Ok(false);
        }
        self.clicks.borrow_mut().push(selector.to_string());

        let script = self
            .scripted_clicks
            .borrow_mut()
            .get_mut(selector)
            .and_then(VecDeque::pop_front);
        if let Some(states) = script {
            let mut states: VecDeque<String> = states.into();
            if let Some(first) = states.pop_front() {
                *self.html.borrow_mut() = first;
            }
            *self.pending_states.borrow_mut() = states;
        }
        Ok(true)
    }

    fn do_not_track(&self) -> bool {
        self.do_not_track.get()
    }

    fn subscribe(&self) -> Subscription {
        let (tx, subscription) = Subscription::channel();
        self.subscribers.borrow_mut().push(tx);
        subscription
    }
}
