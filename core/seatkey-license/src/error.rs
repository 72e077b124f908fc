//! Error types for the licensing module.

use crate::store::StoreError;
use seatkey_billing::BillingError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// Webhook signature verification failed.
    #[error("webhook signature invalid: {0}")]
    InvalidSignature(String),

    /// A recognized webhook event lacks required fields.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// An activation request lacks a required field.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// No license matches the lookup key.
    #[error("license not found")]
    LicenseNotFound,

    /// Every seat on the license is taken.
    #[error("no seats available (max {seats_total} devices)")]
    NoSeatsAvailable { seats_total: u32 },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// The externally visible category of a [`LicenseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Authentication,
    MalformedEvent,
    Validation,
    NotFound,
    Capacity,
    Store,
}

impl LicenseError {
    /// Returns the category callers should branch on.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidSignature(_) => ErrorClass::Authentication,
            Self::MalformedEvent(_) => ErrorClass::MalformedEvent,
            Self::MissingField(_) => ErrorClass::Validation,
            Self::LicenseNotFound => ErrorClass::NotFound,
            Self::NoSeatsAvailable { .. } => ErrorClass::Capacity,
            Self::Store(_) => ErrorClass::Store,
        }
    }
}

impl From<BillingError> for LicenseError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidSignature(reason) => Self::InvalidSignature(reason),
            BillingError::MalformedEvent(reason) => Self::MalformedEvent(reason),
        }
    }
}
