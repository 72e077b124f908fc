//! Schema creation and versioning.

use crate::error::{DbError, DbResult};
use rusqlite::Connection;
use tracing::info;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS licenses (
    id                     TEXT PRIMARY KEY,
    customer_reference     TEXT NOT NULL UNIQUE,
    subscription_reference TEXT,
    seats_total            INTEGER NOT NULL CHECK (seats_total >= 0),
    seats_used             INTEGER NOT NULL DEFAULT 0,
    owner_reference        TEXT,
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS device_registrations (
    license_id   TEXT NOT NULL REFERENCES licenses(id),
    device_id    TEXT NOT NULL,
    activated_at TEXT NOT NULL,
    PRIMARY KEY (license_id, device_id)
);
"#;

/// Brings the database up to [`SCHEMA_VERSION`].
pub(crate) fn migrate(conn: &mut Connection) -> DbResult<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database schema v{version} is newer than supported v{SCHEMA_VERSION}"
        )));
    }
    if version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_V1)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    info!(from = version, to = SCHEMA_VERSION, "migrated license database");
    Ok(())
}
