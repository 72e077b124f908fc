//! SQLite storage for SeatKey licenses.
//!
//! Implements [`seatkey_license::LicenseStore`] on top of rusqlite.
//!
//! # Guarantees
//!
//! - `licenses.customer_reference` is `UNIQUE`, and upserts go through
//!   `INSERT .. ON CONFLICT (customer_reference) DO UPDATE`
//! - `(license_id, device_id)` is the registration primary key
//! - Registrations are inserted inside a `BEGIN IMMEDIATE` transaction that
//!   re-counts seats first, so concurrent activations on the same file
//!   serialize on the write lock instead of overshooting the ceiling

mod error;
mod schema;
mod store;

pub use error::{DbError, DbResult};
pub use schema::SCHEMA_VERSION;
pub use store::SqliteLicenseStore;
