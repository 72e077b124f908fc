//! Core type definitions for SeatKey.
//!
//! This crate defines the identifiers shared by the billing, license and
//! storage crates:
//! - License identifiers (UUID v7, assigned by the store)
//! - Device identifiers (opaque, supplied by the client)
//! - Customer references (issued by the payment provider)

mod ids;

pub use ids::{CustomerRef, DeviceId, LicenseId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
