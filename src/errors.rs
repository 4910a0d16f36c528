/*!
 * Error types for the capfetch pipeline.
 *
 * This module contains the classified extraction error taxonomy,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Classified errors produced by the extraction pipeline.
///
/// The classification drives the retry policy: `Timeout` and `NetworkError`
/// are transient and may be retried, every other kind is terminal and
/// propagates after the first attempt. `Unknown` is deliberately terminal:
/// unclassified failures are not retried indefinitely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The supplied video identifier does not look like a valid id
    #[error("invalid video identifier: {0}")]
    InvalidIdentifier(String),

    /// The video does not exist or is otherwise unavailable
    #[error("video not found: {0}")]
    NotFound(String),

    /// The video is private
    #[error("video is private: {0}")]
    Private(String),

    /// The video has been deleted or removed
    #[error("video has been deleted: {0}")]
    Deleted(String),

    /// The video requires age verification
    #[error("video is age-restricted: {0}")]
    AgeRestricted(String),

    /// The video exists but exposes no usable caption track
    #[error("no transcript available: {0}")]
    NoTranscriptAvailable(String),

    /// A network call exceeded its per-call timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A transport-level failure or a response malformed in a way that may
    /// be a transient render issue
    #[error("network error: {0}")]
    NetworkError(String),

    /// Any failure the pipeline could not classify
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl ExtractError {
    /// Whether a retry of the failed operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::NetworkError(_))
    }

    /// Whether the error will never succeed on retry
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }

    /// Stable label for the error kind, used in bulk report rows
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::NotFound(_) => "not_found",
            Self::Private(_) => "private",
            Self::Deleted(_) => "deleted",
            Self::AgeRestricted(_) => "age_restricted",
            Self::NoTranscriptAvailable(_) => "no_transcript_available",
            Self::Timeout(_) => "timeout",
            Self::NetworkError(_) => "network_error",
            Self::Unknown(_) => "unknown",
        }
    }
}

// Classify transport errors at the reqwest boundary
impl From<reqwest::Error> for ExtractError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else {
            Self::NetworkError(error.to_string())
        }
    }
}

impl From<anyhow::Error> for ExtractError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
