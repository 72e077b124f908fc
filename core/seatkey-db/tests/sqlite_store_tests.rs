use pretty_assertions::assert_eq;
use seatkey_db::{DbError, SCHEMA_VERSION, SqliteLicenseStore};
use seatkey_license::{
    ActivateSeat, ActivationOutcome, InsertOutcome, LicenseError, LicenseStore, LicenseUpsert,
    SeatActivator,
};
use seatkey_types::{CustomerRef, DeviceId, LicenseId};
use std::sync::Arc;

fn upsert(customer: &str, subscription: Option<&str>, seats: u32) -> LicenseUpsert {
    LicenseUpsert {
        customer_reference: CustomerRef::new(customer).unwrap(),
        subscription_reference: subscription.map(String::from),
        seats_total: seats,
    }
}

fn device(id: &str) -> DeviceId {
    DeviceId::new(id).unwrap()
}

// ── Licenses ──────────────────────────────────────────────────────

#[test]
fn upsert_inserts_new_license() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let license = store.upsert_license(&upsert("cus_1", Some("sub_1"), 3)).unwrap();

    assert_eq!(license.customer_reference.as_str(), "cus_1");
    assert_eq!(license.subscription_reference.as_deref(), Some("sub_1"));
    assert_eq!(license.seats_total, 3);
    assert_eq!(license.seats_used, 0);
    assert_eq!(license.owner_reference, None);

    let found = store
        .find_license(&CustomerRef::new("cus_1").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(found, license);
}

#[test]
fn upsert_overwrites_existing_license() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let first = store.upsert_license(&upsert("cus_1", Some("sub_1"), 3)).unwrap();
    let second = store.upsert_license(&upsert("cus_1", None, 1)).unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.seats_total, 1);
    assert_eq!(second.subscription_reference, None);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(store.list_licenses().unwrap().len(), 1);
}

#[test]
fn upsert_keeps_one_row_per_customer() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    for seats in 1..=5 {
        store.upsert_license(&upsert("cus_a", None, seats)).unwrap();
        store.upsert_license(&upsert("cus_b", None, seats)).unwrap();
    }
    let licenses = store.list_licenses().unwrap();
    assert_eq!(licenses.len(), 2);
    assert!(licenses.iter().all(|l| l.seats_total == 5));
}

#[test]
fn find_unknown_license_returns_none() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    assert!(store
        .find_license(&CustomerRef::new("cus_nobody").unwrap())
        .unwrap()
        .is_none());
}

// ── Registrations ─────────────────────────────────────────────────

#[test]
fn insert_registration_respects_ceiling() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let license = store.upsert_license(&upsert("cus_1", None, 2)).unwrap();

    assert_eq!(
        store.insert_registration(&device("A"), license.id).unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_registration(&device("B"), license.id).unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_registration(&device("C"), license.id).unwrap(),
        InsertOutcome::SeatLimitReached
    );
    assert_eq!(
        store.insert_registration(&device("A"), license.id).unwrap(),
        InsertOutcome::AlreadyRegistered
    );

    let mut devices = store.list_registrations(license.id).unwrap();
    devices.sort();
    assert_eq!(devices, vec![device("A"), device("B")]);
}

#[test]
fn registration_records_carry_license_and_time() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let license = store.upsert_license(&upsert("cus_1", None, 1)).unwrap();
    store.insert_registration(&device("A"), license.id).unwrap();

    let records = store.device_registrations(license.id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].device_id, device("A"));
    assert_eq!(records[0].license_id, license.id);
    assert!(records[0].activated_at >= license.created_at);
}

#[test]
fn lowering_seats_does_not_remove_registrations() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let license = store.upsert_license(&upsert("cus_1", None, 2)).unwrap();
    store.insert_registration(&device("A"), license.id).unwrap();
    store.insert_registration(&device("B"), license.id).unwrap();

    store.upsert_license(&upsert("cus_1", None, 1)).unwrap();
    assert_eq!(store.list_registrations(license.id).unwrap().len(), 2);
    assert_eq!(
        store.insert_registration(&device("C"), license.id).unwrap(),
        InsertOutcome::SeatLimitReached
    );
}

#[test]
fn registration_for_unknown_license_is_an_error() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let err = store
        .insert_registration(&device("A"), LicenseId::new())
        .unwrap_err();
    assert!(err.to_string().contains("license not found"));
}

#[test]
fn seats_used_is_never_written_back() {
    let store = SqliteLicenseStore::open_in_memory().unwrap();
    let license = store.upsert_license(&upsert("cus_1", None, 3)).unwrap();
    store.insert_registration(&device("A"), license.id).unwrap();
    store.insert_registration(&device("B"), license.id).unwrap();

    let reloaded = store
        .find_license(&license.customer_reference)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.seats_used, 0);
}

// ── Files and concurrency ─────────────────────────────────────────

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("licenses.db");

    let id = {
        let store = SqliteLicenseStore::open(&path).unwrap();
        let license = store.upsert_license(&upsert("cus_1", None, 2)).unwrap();
        store.insert_registration(&device("A"), license.id).unwrap();
        license.id
    };

    let store = SqliteLicenseStore::open(&path).unwrap();
    let license = store
        .find_license(&CustomerRef::new("cus_1").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(license.id, id);
    assert_eq!(store.list_registrations(id).unwrap(), vec![device("A")]);
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
    }
    assert!(matches!(
        SqliteLicenseStore::open(&path),
        Err(DbError::Migration(_))
    ));
}

#[test]
fn concurrent_activations_never_exceed_ceiling() {
    const SEATS: u32 = 3;
    const DEVICES: usize = 12;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let seed = SqliteLicenseStore::open(&path).unwrap();
    let license = seed.upsert_license(&upsert("cus_race", None, SEATS)).unwrap();

    // Separate connections so the only coordination is SQLite's own locking.
    let stores: Vec<Arc<SqliteLicenseStore>> = (0..DEVICES)
        .map(|_| Arc::new(SqliteLicenseStore::open(&path).unwrap()))
        .collect();

    let barrier = Arc::new(std::sync::Barrier::new(DEVICES));
    let handles: Vec<_> = stores
        .into_iter()
        .enumerate()
        .map(|(i, store)| {
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let activator = SeatActivator::new(store);
                barrier.wait();
                activator.activate(&ActivateSeat {
                    device_id: DeviceId::new(format!("device-{i}")).unwrap(),
                    license_key: CustomerRef::new("cus_race").unwrap(),
                })
            })
        })
        .collect();

    let mut activated = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(ActivationOutcome::Activated) => activated += 1,
            Ok(ActivationOutcome::AlreadyActivated) => panic!("devices are distinct"),
            Err(LicenseError::NoSeatsAvailable { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(activated, SEATS as usize);
    assert_eq!(
        seed.list_registrations(license.id).unwrap().len(),
        SEATS as usize
    );
}
