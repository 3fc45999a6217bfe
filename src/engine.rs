//! Content Engine
//!
//! Ties the dispatcher to the analysis service and the overlay, and takes
//! toggles and settings from the host. The engine owns the dispatcher and
//! with it every extractor; nothing is shared between engines.

use std::cell::Cell;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisRequest, AnalysisService, Credibility, OverlaySink};
use crate::dispatcher::StrategyDispatcher;
use crate::error::{Error, Result};
use crate::host::PageHost;
use crate::options::{Options, SettingsOverrides};
use crate::result::ExtractedContent;

/// Messages the host sends over its message channel.
///
/// ```json
/// {"type": "toggle", "enabled": false}
/// {"type": "settings", "settings": {"between_items_ms": 1500}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Toggle { enabled: bool },
    Settings { settings: SettingsOverrides },
}

impl HostMessage {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("host message: {e}")))
    }
}

/// Outcome of [`ContentEngine::process_page`].
#[derive(Debug, Clone)]
pub struct PageReport {
    pub content: ExtractedContent,
    pub credibility: Credibility,

    /// Set when `content` is a placeholder.
    pub error: Option<Error>,
}

/// Outcome of [`ContentEngine::observe`].
#[derive(Debug, Clone, Default)]
pub struct ObserveReport {
    /// Observer passes that completed.
    pub passes: usize,

    /// New items rendered, in arrival order.
    pub items: Vec<ExtractedContent>,
}

/// Dispatcher plus analysis and overlay.
pub struct ContentEngine<A, O> {
    dispatcher: StrategyDispatcher,
    analysis: A,
    overlay: O,
    enabled: Cell<bool>,
}

impl<A, O> std::fmt::Debug for ContentEngine<A, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentEngine")
            .field("dispatcher", &self.dispatcher)
            .field("enabled", &self.enabled.get())
            .finish_non_exhaustive()
    }
}

impl<A: AnalysisService, O: OverlaySink> ContentEngine<A, O> {
    #[must_use]
    pub fn new(options: &Options, analysis: A, overlay: O) -> Self {
        Self {
            dispatcher: StrategyDispatcher::new(options),
            analysis,
            overlay,
            enabled: Cell::new(true),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &StrategyDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable extraction. Disabling disconnects every observer.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) != enabled {
            info!(enabled, "engine toggled");
        }
        if !enabled {
            self.dispatcher.stop_observing();
        }
    }

    /// Apply one host message (JSON). Malformed messages are a `Config` error
    /// and change nothing.
    pub fn handle_host_message(&self, raw: &str) -> Result<()> {
        match HostMessage::from_json(raw)? {
            HostMessage::Toggle { enabled } => self.set_enabled(enabled),
            HostMessage::Settings { settings } => {
                debug!(?settings, "host settings received");
                self.dispatcher.apply_overrides(&settings);
            }
        }
        Ok(())
    }

    /// Extract the page's main item, analyze it, and render it.
    ///
    /// Returns `None` while the engine is disabled. Placeholders are rendered
    /// as pending so the overlay can suppress them.
    pub async fn process_page(&self, host: &dyn PageHost) -> Option<PageReport> {
        if !self.is_enabled() {
            debug!(url = %host.url(), "engine disabled, page skipped");
            return None;
        }
        let dispatched = self.dispatcher.dispatch(host).await;
        let credibility = self.analyze(&dispatched.content).await;
        self.overlay.render(&dispatched.content, &credibility);
        Some(PageReport {
            content: dispatched.content,
            credibility,
            error: dispatched.error,
        })
    }

    /// Follow the page as it changes, for at most `max_passes` observer passes.
    ///
    /// Items already on the page when observation starts are not reported.
    /// The subscription is disconnected before returning, whatever ends the
    /// loop: the pass limit, the host closing its event stream, or the
    /// engine being disabled.
    pub async fn observe(&self, host: &dyn PageHost, max_passes: usize) -> ObserveReport {
        let mut report = ObserveReport::default();
        if !self.is_enabled() {
            return report;
        }
        let extractor = match self.dispatcher.select(host).await {
            Ok(extractor) => extractor,
            Err(err) => {
                warn!(url = %host.url(), error = %err, "cannot observe page");
                return report;
            }
        };

        let initial = extractor.extract_items(host).await.unwrap_or_default();
        if !extractor.start_observing(host, &initial) {
            return report;
        }

        while report.passes < max_passes && self.is_enabled() {
            let Some(items) = extractor.next_new_items(host).await else {
                break;
            };
            report.passes += 1;
            for item in items {
                let credibility = self.analyze(&item).await;
                self.overlay.render(&item, &credibility);
                report.items.push(item);
            }
        }

        extractor.stop_observing();
        debug!(
            platform = %extractor.platform(),
            passes = report.passes,
            items = report.items.len(),
            "observation ended"
        );
        report
    }

    async fn analyze(&self, content: &ExtractedContent) -> Credibility {
        match AnalysisRequest::for_content(content) {
            Some(request) => Credibility::from(self.analysis.analyze(&request).await),
            None => Credibility::Pending,
        }
    }

    /// Disconnect observers and drop all cached state.
    pub fn cleanup(&self) {
        self.dispatcher.cleanup();
    }
}
