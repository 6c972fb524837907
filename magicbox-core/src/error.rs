use std::time::Duration;

use thiserror::Error;

/// Errors reported by backend adapters (speaker, video, TV, audio, reader)
///
/// Adapters convert their own error types into this taxonomy at the trait
/// boundary. The dispatcher never lets one of these escape; it turns them into
/// [`ActionOutcome::Failure`](crate::ActionOutcome::Failure).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached (network down, device missing,
    /// helper binary not installed)
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend was reached but refused the request (unknown room,
    /// unsupported link, SOAP fault)
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    /// The backend did not answer within its time budget
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Whether the failure is about reachability rather than the request itself
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result alias used by every backend trait
pub type BackendResult<T> = std::result::Result<T, BackendError>;
