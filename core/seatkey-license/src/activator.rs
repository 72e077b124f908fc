//! Device seat activation.

use crate::error::{LicenseError, LicenseResult};
use crate::store::{InsertOutcome, LicenseStore};
use seatkey_types::{CustomerRef, DeviceId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Activation request as it arrives on the wire. Both fields are optional
/// here so that absence is reported as a missing field, not a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub license_key: Option<String>,
}

/// A validated activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateSeat {
    pub device_id: DeviceId,
    /// Currently the license's customer reference.
    pub license_key: CustomerRef,
}

impl ActivationRequest {
    /// Checks that both fields are present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` naming the first absent field.
    pub fn validate(self) -> LicenseResult<ActivateSeat> {
        let device_id = self
            .device_id
            .and_then(|v| DeviceId::new(v).ok())
            .ok_or(LicenseError::MissingField("device_id"))?;
        let license_key = self
            .license_key
            .and_then(|v| CustomerRef::new(v).ok())
            .ok_or(LicenseError::MissingField("license_key"))?;
        Ok(ActivateSeat {
            device_id,
            license_key,
        })
    }
}

/// Successful activation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The device already held a seat; nothing was written.
    AlreadyActivated,
    /// The device took a new seat.
    Activated,
}

/// Grants devices seats on licenses.
pub struct SeatActivator {
    store: Arc<dyn LicenseStore>,
}

impl SeatActivator {
    #[must_use]
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self { store }
    }

    /// Claims a seat for `request.device_id`.
    ///
    /// A device that is already registered is let through before the seat
    /// ceiling is considered. The ceiling is checked against a fresh count of
    /// registrations, never against the license's `seats_used` field.
    ///
    /// # Errors
    ///
    /// `LicenseNotFound`, `NoSeatsAvailable`, or `Store`.
    pub fn activate(&self, request: &ActivateSeat) -> LicenseResult<ActivationOutcome> {
        let ActivateSeat {
            device_id,
            license_key,
        } = request;

        let license = self
            .store
            .find_license(license_key)
            .map_err(|e| log_store_error("find_license", e))?
            .ok_or(LicenseError::LicenseNotFound)?;

        let registered = self
            .store
            .list_registrations(license.id)
            .map_err(|e| log_store_error("list_registrations", e))?;

        if registered.contains(device_id) {
            info!(license = %license.id, device = %device_id, "device already activated");
            return Ok(ActivationOutcome::AlreadyActivated);
        }

        let seats_total = license.seats_total;
        if registered.len() >= seats_total as usize {
            info!(license = %license.id, device = %device_id, seats_total, "no seats available");
            return Err(LicenseError::NoSeatsAvailable { seats_total });
        }

        match self
            .store
            .insert_registration(device_id, license.id)
            .map_err(|e| log_store_error("insert_registration", e))?
        {
            InsertOutcome::Inserted => {
                info!(
                    license = %license.id,
                    device = %device_id,
                    used = registered.len() + 1,
                    seats_total,
                    "device activated"
                );
                Ok(ActivationOutcome::Activated)
            }
            // A concurrent request for the same device got there first.
            InsertOutcome::AlreadyRegistered => Ok(ActivationOutcome::AlreadyActivated),
            // Concurrent requests for other devices filled the last seat.
            InsertOutcome::SeatLimitReached => {
                info!(
                    license = %license.id,
                    device = %device_id,
                    seats_total,
                    "seat taken concurrently"
                );
                Err(LicenseError::NoSeatsAvailable { seats_total })
            }
        }
    }
}

fn log_store_error(operation: &'static str, err: crate::store::StoreError) -> LicenseError {
    error!(operation, error = %err, "store call failed during activation");
    LicenseError::Store(err)
}
