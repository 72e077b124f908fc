//! License and device registration records.

use chrono::{DateTime, Utc};
use seatkey_billing::CheckoutCompleted;
use seatkey_types::{CustomerRef, DeviceId, LicenseId};
use serde::{Deserialize, Serialize};

/// A purchased bundle of seats, keyed to a payment customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Store-assigned primary key.
    pub id: LicenseId,
    /// Payment-provider customer; unique across licenses.
    pub customer_reference: CustomerRef,
    /// Payment-provider subscription, if the checkout created one.
    pub subscription_reference: Option<String>,
    /// Maximum number of device registrations.
    pub seats_total: u32,
    /// Informational counter written as 0 at creation. Seat enforcement
    /// counts registrations instead, so this value is not kept in sync.
    pub seats_used: u32,
    /// Account the license has been attached to, if any.
    pub owner_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A device holding one seat on a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub device_id: DeviceId,
    pub license_id: LicenseId,
    pub activated_at: DateTime<Utc>,
}

/// The values a checkout writes into a license row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseUpsert {
    pub customer_reference: CustomerRef,
    pub subscription_reference: Option<String>,
    pub seats_total: u32,
}

impl From<CheckoutCompleted> for LicenseUpsert {
    fn from(checkout: CheckoutCompleted) -> Self {
        Self {
            customer_reference: checkout.customer_reference,
            subscription_reference: checkout.subscription_reference,
            seats_total: checkout.seats,
        }
    }
}
