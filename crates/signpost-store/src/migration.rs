//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_secs()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Directory records: one row per registered name.
        CREATE TABLE records (
            name TEXT PRIMARY KEY,            -- lowercase, <= 63 bytes
            public_key TEXT NOT NULL UNIQUE,  -- identity key, 64 uppercase hex chars
            auth_key TEXT NOT NULL,           -- envelope key of the registering client
            pin TEXT NOT NULL,                -- 8 hex chars, or empty
            checksum TEXT NOT NULL,           -- 4 hex chars
            bio TEXT NOT NULL,
            privacy INTEGER NOT NULL DEFAULT 0,  -- 0 = discoverable
            password_hash BLOB,               -- salt(16) || SHA-512(salt || password)
            signature TEXT NOT NULL,          -- base64 authority signature over the record
            updated_at INTEGER NOT NULL       -- Unix seconds
        );

        CREATE INDEX idx_records_auth_key ON records(auth_key);
        CREATE INDEX idx_records_privacy_name ON records(privacy, name);
        "#,
    )?;

    Ok(())
}

/// Get current time in seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
