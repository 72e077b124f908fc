use crate::error::{DbError, DbResult};
use crate::schema;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use seatkey_license::{
    DeviceRegistration, InsertOutcome, License, LicenseStore, LicenseUpsert, StoreResult,
};
use seatkey_types::{CustomerRef, DeviceId, LicenseId};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LICENSE_COLUMNS: &str = "id, customer_reference, subscription_reference, seats_total, \
     seats_used, owner_reference, created_at, updated_at";

/// A [`LicenseStore`] backed by a single SQLite connection.
pub struct SqliteLicenseStore {
    conn: Mutex<Connection>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) the database at `path` and migrates it.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.display(), journal_mode = %mode, "opened license database");
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> DbResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Returns every license, oldest first.
    pub fn list_licenses(&self) -> DbResult<Vec<License>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LICENSE_COLUMNS} FROM licenses ORDER BY created_at, id"
        ))?;
        let rows = stmt
            .query_map([], LicenseRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(License::try_from).collect()
    }

    /// Returns the full registration records of a license, oldest first.
    pub fn device_registrations(&self, license_id: LicenseId) -> DbResult<Vec<DeviceRegistration>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT device_id, activated_at FROM device_registrations
             WHERE license_id = ?1 ORDER BY activated_at, device_id",
        )?;
        let rows = stmt
            .query_map(params![license_id.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, DateTime<Utc>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(device_id, activated_at)| {
                Ok(DeviceRegistration {
                    device_id: parse_device(device_id)?,
                    license_id,
                    activated_at,
                })
            })
            .collect()
    }

    fn find(&self, lookup_key: &CustomerRef) -> DbResult<Option<License>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {LICENSE_COLUMNS} FROM licenses WHERE customer_reference = ?1"),
                params![lookup_key.as_str()],
                LicenseRow::from_row,
            )
            .optional()?;
        row.map(License::try_from).transpose()
    }

    fn registrations(&self, license_id: LicenseId) -> DbResult<Vec<DeviceId>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT device_id FROM device_registrations WHERE license_id = ?1")?;
        let ids = stmt
            .query_map(params![license_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.into_iter().map(parse_device).collect()
    }

    fn register(&self, device_id: &DeviceId, license_id: LicenseId) -> DbResult<InsertOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let key = license_id.to_string();

        let seats_total: u32 = tx
            .query_row(
                "SELECT seats_total FROM licenses WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| DbError::MissingLicense(key.clone()))?;

        let already: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM device_registrations
                            WHERE license_id = ?1 AND device_id = ?2)",
            params![key, device_id.as_str()],
            |row| row.get(0),
        )?;
        if already {
            return Ok(InsertOutcome::AlreadyRegistered);
        }

        let used: u32 = tx.query_row(
            "SELECT COUNT(*) FROM device_registrations WHERE license_id = ?1",
            params![key],
            |row| row.get(0),
        )?;
        if used >= seats_total {
            return Ok(InsertOutcome::SeatLimitReached);
        }

        tx.execute(
            "INSERT INTO device_registrations (license_id, device_id, activated_at)
             VALUES (?1, ?2, ?3)",
            params![key, device_id.as_str(), Utc::now()],
        )?;
        tx.commit()?;
        Ok(InsertOutcome::Inserted)
    }

    fn upsert(&self, upsert: &LicenseUpsert) -> DbResult<License> {
        let conn = self.conn()?;
        let now = Utc::now();
        let row = conn.query_row(
            &format!(
                "INSERT INTO licenses
                     (id, customer_reference, subscription_reference, seats_total,
                      seats_used, owner_reference, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5, ?5)
                 ON CONFLICT (customer_reference) DO UPDATE SET
                     subscription_reference = excluded.subscription_reference,
                     seats_total = excluded.seats_total,
                     updated_at = excluded.updated_at
                 RETURNING {LICENSE_COLUMNS}"
            ),
            params![
                LicenseId::new().to_string(),
                upsert.customer_reference.as_str(),
                upsert.subscription_reference,
                upsert.seats_total,
                now,
            ],
            LicenseRow::from_row,
        )?;
        License::try_from(row)
    }
}

impl LicenseStore for SqliteLicenseStore {
    fn find_license(&self, lookup_key: &CustomerRef) -> StoreResult<Option<License>> {
        Ok(self.find(lookup_key)?)
    }

    fn list_registrations(&self, license_id: LicenseId) -> StoreResult<Vec<DeviceId>> {
        Ok(self.registrations(license_id)?)
    }

    fn insert_registration(
        &self,
        device_id: &DeviceId,
        license_id: LicenseId,
    ) -> StoreResult<InsertOutcome> {
        Ok(self.register(device_id, license_id)?)
    }

    fn upsert_license(&self, upsert: &LicenseUpsert) -> StoreResult<License> {
        Ok(self.upsert(upsert)?)
    }
}

/// A `licenses` row before its text columns are validated.
struct LicenseRow {
    id: String,
    customer_reference: String,
    subscription_reference: Option<String>,
    seats_total: u32,
    seats_used: u32,
    owner_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LicenseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_reference: row.get(1)?,
            subscription_reference: row.get(2)?,
            seats_total: row.get(3)?,
            seats_used: row.get(4)?,
            owner_reference: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<LicenseRow> for License {
    type Error = DbError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LicenseId::parse(&row.id)
                .map_err(|e| DbError::InvalidData(format!("license id {}: {e}", row.id)))?,
            customer_reference: CustomerRef::new(row.customer_reference)
                .map_err(|e| DbError::InvalidData(e.to_string()))?,
            subscription_reference: row.subscription_reference,
            seats_total: row.seats_total,
            seats_used: row.seats_used,
            owner_reference: row.owner_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_device(raw: String) -> DbResult<DeviceId> {
    DeviceId::new(raw).map_err(|e| DbError::InvalidData(e.to_string()))
}
