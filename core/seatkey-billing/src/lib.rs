//! Payment provider webhooks for SeatKey.
//!
//! This crate authenticates webhook deliveries and turns them into typed
//! events:
//! - `Stripe-Signature` header parsing and HMAC-SHA256 verification
//! - Replay protection through a timestamp tolerance window
//! - Parse-and-validate decoding of the event envelope
//!
//! # Verification Order
//!
//! The signature covers the exact bytes the provider sent. Verification
//! always runs on the raw body, and the body is only decoded as JSON once
//! it has been authenticated.

mod error;
mod event;
mod signature;
mod verifier;

pub use error::{BillingError, BillingResult};
pub use event::{
    CHECKOUT_SESSION_COMPLETED, CheckoutCompleted, DEFAULT_SEATS, PaymentEvent, PaymentEventKind,
};
pub use signature::{SIGNATURE_HEADER, compute_signature};
pub use verifier::{DEFAULT_TOLERANCE_SECS, EventVerifier, StripeVerifier};
