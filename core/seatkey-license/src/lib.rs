//! Licensing and seat activation for SeatKey.
//!
//! This crate handles:
//! - Reconciling payment webhooks into license records
//! - Granting devices a seat on a license, at most once each
//! - The storage contract both of those rely on
//!
//! # Design Principles
//!
//! - **Provider is the source of truth**: a license's seat total is whatever
//!   the latest checkout said, overwritten rather than accumulated
//! - **Idempotent activation**: a device that already holds a seat is
//!   always let back in, even when the license is full
//! - **Store-enforced ceiling**: the final seat check happens inside the
//!   store so concurrent activations cannot overshoot
//! - **Injected collaborators**: handlers receive their store and verifier
//!   at construction, nothing is global

mod activator;
mod error;
mod model;
mod reconciler;
mod store;

pub use activator::{ActivateSeat, ActivationOutcome, ActivationRequest, SeatActivator};
pub use error::{ErrorClass, LicenseError, LicenseResult};
pub use model::{DeviceRegistration, License, LicenseUpsert};
pub use reconciler::{ReconcileOutcome, WebhookReconciler};
pub use store::{InsertOutcome, LicenseStore, StoreError, StoreResult};
