//! Error types for webhook verification.

use thiserror::Error;

/// Errors produced while authenticating or decoding a provider event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BillingError {
    /// The signature header is missing, unparsable, stale, or does not match the payload.
    #[error("webhook signature invalid: {0}")]
    InvalidSignature(String),

    /// The payload was authentic but is not a usable event.
    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

/// Result type for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;
