//! Error types for rs-social-extract.
//!
//! Call-level failures are represented by [`Error`]. Field-level problems never
//! surface here: they are recorded as strings in
//! [`ExtractionMetadata::errors`](crate::ExtractionMetadata) and extraction
//! carries on.

use serde::{Deserialize, Serialize};

/// Error type for extraction operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No selector in a group resolved to an element.
    #[error("Selector resolution failed for field `{0}`")]
    SelectorResolution(String),

    /// The page has no element that can serve as the content root.
    #[error("No content root found")]
    NoContentRoot,

    /// Extraction did not finish before the deadline.
    #[error("Extraction timed out after {0} ms")]
    ExtractionTimeout(u64),

    /// The session cap or another self-imposed limit denied the call.
    #[error("Rate limit exceeded: {reason}")]
    RateLimitExceeded {
        /// Human-readable explanation.
        reason: String,
    },

    /// A compliance signal (e.g. a tracking preference) forbids extraction.
    #[error("Extraction blocked: {reason}")]
    ComplianceBlocked {
        /// Human-readable explanation.
        reason: String,
    },

    /// Embedded structured data was present but could not be decoded.
    #[error("Malformed embedded data: {0}")]
    MalformedEmbeddedData(String),

    /// The page host failed to deliver a snapshot or perform an interaction.
    #[error("Page host error: {0}")]
    Host(String),

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Discriminant of [`Error`], used for counters and placeholder results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SelectorResolution,
    NoContentRoot,
    ExtractionTimeout,
    RateLimitExceeded,
    ComplianceBlocked,
    MalformedEmbeddedData,
    Host,
    Config,
}

impl ErrorKind {
    /// Stable snake_case name, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectorResolution => "selector_resolution",
            Self::NoContentRoot => "no_content_root",
            Self::ExtractionTimeout => "extraction_timeout",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ComplianceBlocked => "compliance_blocked",
            Self::MalformedEmbeddedData => "malformed_embedded_data",
            Self::Host => "host",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelectorResolution(_) => ErrorKind::SelectorResolution,
            Self::NoContentRoot => ErrorKind::NoContentRoot,
            Self::ExtractionTimeout(_) => ErrorKind::ExtractionTimeout,
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::ComplianceBlocked { .. } => ErrorKind::ComplianceBlocked,
            Self::MalformedEmbeddedData(_) => ErrorKind::MalformedEmbeddedData,
            Self::Host(_) => ErrorKind::Host,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the standard retry policy applies to this error.
    ///
    /// Timeouts and transient host failures are retried. Rate-limit denials
    /// are surfaced with their reason, compliance blocks are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExtractionTimeout(_) | Self::Host(_))
    }

    /// Whether the error aborts the extraction call.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SelectorResolution(_) | Self::MalformedEmbeddedData(_)
        )
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
