//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::Utc;
use hmac::{Hmac, Mac};
use seatkey_license::{
    InsertOutcome, License, LicenseStore, LicenseUpsert, StoreError, StoreResult,
};
use seatkey_types::{CustomerRef, DeviceId, LicenseId};
use sha2::Sha256;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const SECRET: &str = "whsec_license_tests";

#[derive(Default)]
struct State {
    licenses: Vec<License>,
    registrations: Vec<(DeviceId, LicenseId)>,
}

/// In-memory `LicenseStore` with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail: AtomicBool,
    writes: AtomicUsize,
    forced_insert: Mutex<Option<InsertOutcome>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call return a backend error.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Makes the next insert report `outcome` without writing.
    pub fn force_next_insert(&self, outcome: InsertOutcome) {
        *self.forced_insert.lock().unwrap() = Some(outcome);
    }

    /// Number of mutating calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn license_count(&self) -> usize {
        self.state.lock().unwrap().licenses.len()
    }

    pub fn registration_count(&self, license_id: LicenseId) -> usize {
        self.state
            .lock()
            .unwrap()
            .registrations
            .iter()
            .filter(|(_, id)| *id == license_id)
            .count()
    }

    /// Seeds a license directly, bypassing the reconciler.
    pub fn seed(&self, customer: &str, seats_total: u32) -> License {
        self.upsert_license(&LicenseUpsert {
            customer_reference: CustomerRef::new(customer).unwrap(),
            subscription_reference: None,
            seats_total,
        })
        .unwrap()
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

impl LicenseStore for MemoryStore {
    fn find_license(&self, lookup_key: &CustomerRef) -> StoreResult<Option<License>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .licenses
            .iter()
            .find(|l| &l.customer_reference == lookup_key)
            .cloned())
    }

    fn list_registrations(&self, license_id: LicenseId) -> StoreResult<Vec<DeviceId>> {
        self.check()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .registrations
            .iter()
            .filter(|(_, id)| *id == license_id)
            .map(|(device, _)| device.clone())
            .collect())
    }

    fn insert_registration(
        &self,
        device_id: &DeviceId,
        license_id: LicenseId,
    ) -> StoreResult<InsertOutcome> {
        self.check()?;
        if let Some(outcome) = self.forced_insert.lock().unwrap().take() {
            return Ok(outcome);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state
            .registrations
            .iter()
            .any(|(d, id)| d == device_id && *id == license_id)
        {
            return Ok(InsertOutcome::AlreadyRegistered);
        }
        let seats_total = state
            .licenses
            .iter()
            .find(|l| l.id == license_id)
            .map(|l| l.seats_total)
            .ok_or_else(|| StoreError::Backend("foreign key violation".to_string()))?;
        let used = state
            .registrations
            .iter()
            .filter(|(_, id)| *id == license_id)
            .count();
        if used >= seats_total as usize {
            return Ok(InsertOutcome::SeatLimitReached);
        }
        state.registrations.push((device_id.clone(), license_id));
        Ok(InsertOutcome::Inserted)
    }

    fn upsert_license(&self, upsert: &LicenseUpsert) -> StoreResult<License> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = state
            .licenses
            .iter_mut()
            .find(|l| l.customer_reference == upsert.customer_reference)
        {
            existing.subscription_reference = upsert.subscription_reference.clone();
            existing.seats_total = upsert.seats_total;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let license = License {
            id: LicenseId::new(),
            customer_reference: upsert.customer_reference.clone(),
            subscription_reference: upsert.subscription_reference.clone(),
            seats_total: upsert.seats_total,
            seats_used: 0,
            owner_reference: None,
            created_at: now,
            updated_at: now,
        };
        state.licenses.push(license.clone());
        Ok(license)
    }
}

/// Signs `payload` for the current time.
pub fn signature_header(payload: &[u8], secret: &str) -> String {
    let t = Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{t}.").as_bytes());
    mac.update(payload);
    format!("t={t},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A `checkout.session.completed` envelope.
pub fn checkout_payload(
    customer: &str,
    subscription: Option<&str>,
    seats: Option<&str>,
) -> Vec<u8> {
    let mut object = serde_json::json!({ "customer": customer, "subscription": subscription });
    if let Some(seats) = seats {
        object["metadata"] = serde_json::json!({ "seats": seats });
    }
    serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": object }
    })
    .to_string()
    .into_bytes()
}

pub fn device(id: &str) -> DeviceId {
    DeviceId::new(id).unwrap()
}

pub fn customer(id: &str) -> CustomerRef {
    CustomerRef::new(id).unwrap()
}
