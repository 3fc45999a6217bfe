//! Boundaries to the credibility service and the overlay.
//!
//! The engine sends one [`AnalysisRequest`] per usable item and hands the
//! item plus whatever came back to an [`OverlaySink`]. How either side is
//! implemented (message passing, HTTP, a rendering layer) is up to the host.

use std::cell::RefCell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::{ContentKind, ExtractedContent, Platform};

/// One message to the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub request_id: Uuid,
    pub platform: Platform,
    pub kind: ContentKind,

    /// Normalized item, extraction metadata included.
    pub content: ExtractedContent,
}

impl AnalysisRequest {
    /// Build a request for a usable item; placeholders and empty items get none.
    #[must_use]
    pub fn for_content(content: &ExtractedContent) -> Option<Self> {
        if !content.is_usable() || content.metadata.failure.is_some() {
            return None;
        }
        Some(Self {
            request_id: Uuid::new_v4(),
            platform: content.platform,
            kind: content.kind(),
            content: content.clone(),
        })
    }

    /// JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The service's verdict on one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityJudgment {
    /// Credibility in [0, 1].
    pub score: f64,

    /// The service's confidence in `score`, in [0, 1].
    pub confidence: f64,

    pub reasoning: String,
}

impl CredibilityJudgment {
    /// Clamp both figures into [0, 1]; NaN reads as 0.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        self.score = clamp(self.score);
        self.confidence = clamp(self.confidence);
        self
    }
}

/// What the overlay gets for an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Credibility {
    /// No answer (yet), or the item was not analyzable.
    Pending,
    Judged(CredibilityJudgment),
}

impl From<Option<CredibilityJudgment>> for Credibility {
    fn from(judgment: Option<CredibilityJudgment>) -> Self {
        judgment.map_or(Self::Pending, |j| Self::Judged(j.clamped()))
    }
}

/// Downstream credibility scoring.
#[async_trait(?Send)]
pub trait AnalysisService {
    /// `None` means no judgment is available; the item stays pending.
    async fn analyze(&self, request: &AnalysisRequest) -> Option<CredibilityJudgment>;
}

/// A service that never answers. Every item stays [`Credibility::Pending`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingAnalysis;

#[async_trait(?Send)]
impl AnalysisService for PendingAnalysis {
    async fn analyze(&self, _request: &AnalysisRequest) -> Option<CredibilityJudgment> {
        None
    }
}

/// Receives items for rendering.
pub trait OverlaySink {
    fn render(&self, content: &ExtractedContent, credibility: &Credibility);
}

/// Overlay that keeps everything it is given, for hosts that batch rendering
/// and for tests.
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    rendered: RefCell<Vec<(ExtractedContent, Credibility)>>,
}

impl RecordingOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rendered(&self) -> Vec<(ExtractedContent, Credibility)> {
        self.rendered.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rendered.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.borrow().is_empty()
    }
}

impl OverlaySink for RecordingOverlay {
    fn render(&self, content: &ExtractedContent, credibility: &Credibility) {
        self.rendered.borrow_mut().push((content.clone(), credibility.clone()));
    }
}
