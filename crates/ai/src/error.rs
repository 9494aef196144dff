//! AI operation error types.

use std::time::Duration;

use thiserror::Error;

/// AI operation errors.
///
/// Only `Cancelled` ever reaches `AiClient` callers; every other variant is
/// converted to an operation-specific fallback value inside the client.
/// Providers return the full range.
#[derive(Debug, Clone, Error)]
pub enum AiError {
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("operation cancelled")]
    Cancelled,
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("rate limited by provider")]
    RateLimited,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("provider service unavailable")]
    ServiceUnavailable,
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    /// True when the failure is attributable to cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
