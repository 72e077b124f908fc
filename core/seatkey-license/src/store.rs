//! Persistence contract for licenses and device registrations.
//!
//! The store is a relational database in production. Implementations must
//! guarantee two things the handlers cannot:
//! - `upsert_license` is atomic on the customer reference (conflict target,
//!   not read-then-write)
//! - `insert_registration` re-checks the seat ceiling and the
//!   `(device_id, license_id)` pair in the same transaction as the insert

use crate::model::{License, LicenseUpsert};
use seatkey_types::{CustomerRef, DeviceId, LicenseId};
use thiserror::Error;

/// A failure inside the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend reported an error.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Stored data could not be mapped back into the model.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of [`LicenseStore::insert_registration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new registration row was written.
    Inserted,
    /// The device was already registered on this license; nothing written.
    AlreadyRegistered,
    /// The license had no free seat when the insert was attempted.
    SeatLimitReached,
}

/// Storage for licenses and device registrations.
pub trait LicenseStore: Send + Sync {
    /// Looks up a license by its activation key (the customer reference).
    fn find_license(&self, lookup_key: &CustomerRef) -> StoreResult<Option<License>>;

    /// Lists the devices registered on a license.
    fn list_registrations(&self, license_id: LicenseId) -> StoreResult<Vec<DeviceId>>;

    /// Registers a device on a license, subject to its seat ceiling.
    fn insert_registration(
        &self,
        device_id: &DeviceId,
        license_id: LicenseId,
    ) -> StoreResult<InsertOutcome>;

    /// Creates or overwrites the license for `upsert.customer_reference`.
    ///
    /// An existing row keeps its id, `seats_used`, `owner_reference` and
    /// `created_at`; only the subscription and seat total change. A new row
    /// starts with `seats_used = 0` and no owner.
    fn upsert_license(&self, upsert: &LicenseUpsert) -> StoreResult<License>;
}
