//! SQLite implementation of the DirectoryStore trait.
//!
//! This is the primary storage backend for the directory. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use signpost_core::Record;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DirectoryStore, NewRecord, UpsertOutcome};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. The mutex doubles as the
/// exclusive critical section the upsert uniqueness checks require.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(format!("mutex poisoned: {}", e)),
    ))
}

fn join_failed(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(format!("spawn_blocking failed: {}", e)),
    ))
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ffi::ErrorCode::ConstraintViolation
    )
}

const RECORD_COLUMNS: &str = "name, public_key, auth_key, pin, checksum, bio, privacy, \
                              password_hash, signature, updated_at";

// Helper to convert a row to Record. Column order must match RECORD_COLUMNS.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        name: row.get(0)?,
        public_key: row.get(1)?,
        auth_key: row.get(2)?,
        pin: row.get(3)?,
        checksum: row.get(4)?,
        bio: row.get(5)?,
        privacy: row.get(6)?,
        password_hash: row.get(7)?,
        signature: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn get_by_name(&self, name: &str) -> Result<Option<Record>> {
        let name = name.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE name = ?1"),
                params![name],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
        .map_err(join_failed)?
    }

    async fn get_by_key(&self, public_key: &str) -> Result<Option<Record>> {
        let public_key = public_key.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE public_key = ?1"),
                params![public_key],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
        .map_err(join_failed)?
    }

    async fn upsert(&self, record: NewRecord) -> Result<UpsertOutcome> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            // Identity key already bound to a different name?
            let name_for_key: Option<String> = conn
                .query_row(
                    "SELECT name FROM records WHERE public_key = ?1",
                    params![record.public_key],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_name) = name_for_key {
                if existing_name != record.name {
                    return Ok(UpsertOutcome::DuplicateIdentity);
                }
            }

            // Name owned by someone else?
            let owner: Option<String> = conn
                .query_row(
                    "SELECT auth_key FROM records WHERE name = ?1",
                    params![record.name],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = match &owner {
                Some(auth_key) if *auth_key != record.auth_key => {
                    return Ok(UpsertOutcome::NameTaken)
                }
                Some(_) => UpsertOutcome::Updated,
                None => UpsertOutcome::Created,
            };

            // A republish without a password keeps the stored hash.
            let write = conn.execute(
                "INSERT INTO records (
                    name, public_key, auth_key, pin, checksum, bio, privacy,
                    password_hash, signature, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(name) DO UPDATE SET
                    public_key = excluded.public_key,
                    auth_key = excluded.auth_key,
                    pin = excluded.pin,
                    checksum = excluded.checksum,
                    bio = excluded.bio,
                    privacy = excluded.privacy,
                    password_hash = COALESCE(excluded.password_hash, password_hash),
                    signature = excluded.signature,
                    updated_at = excluded.updated_at",
                params![
                    record.name,
                    record.public_key,
                    record.auth_key,
                    record.pin,
                    record.checksum,
                    record.bio,
                    record.privacy,
                    record.password_hash,
                    record.signature,
                    now_secs(),
                ],
            );

            match write {
                Ok(_) => Ok(outcome),
                // Lost a race on the public_key uniqueness constraint.
                Err(e) if is_constraint_violation(&e) => {
                    debug!(name = %record.name, "upsert lost uniqueness race");
                    Ok(UpsertOutcome::DuplicateIdentity)
                }
                Err(e) => Err(StoreError::from(e)),
            }
        })
        .await
        .map_err(join_failed)?
    }

    async fn release(&self, auth_key: &str) -> Result<Option<Record>> {
        let auth_key = auth_key.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            let record: Option<Record> = conn
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM records WHERE auth_key = ?1"),
                    params![auth_key],
                    row_to_record,
                )
                .optional()?;

            if record.is_some() {
                conn.execute("DELETE FROM records WHERE auth_key = ?1", params![auth_key])?;
            }

            Ok(record)
        })
        .await
        .map_err(join_failed)?
    }

    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Record>> {
        let query = query.to_lowercase();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            // instr() avoids LIKE-wildcard injection from the query string.
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE privacy = 0 AND instr(name, ?1) > 0
                 ORDER BY name LIMIT ?2 OFFSET ?3"
            ))?;

            let records = stmt
                .query_map(
                    params![query, per_page as i64, (page as i64) * (per_page as i64)],
                    row_to_record,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records)
        })
        .await
        .map_err(join_failed)?
    }

    async fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE privacy = 0
                 ORDER BY name LIMIT ?1 OFFSET ?2"
            ))?;

            let records = stmt
                .query_map(
                    params![per_page as i64, (page as i64) * (per_page as i64)],
                    row_to_record,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(records)
        })
        .await
        .map_err(join_failed)?
    }

    async fn count_records(&self) -> Result<u64> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned)?;

            let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

            Ok(count as u64)
        })
        .await
        .map_err(join_failed)?
    }
}

/// Get current time in seconds.
fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(name: &str, public_key: &str, auth_key: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            public_key: public_key.to_string(),
            auth_key: auth_key.to_string(),
            pin: "0000".to_string(),
            checksum: "ABCD".to_string(),
            bio: String::new(),
            privacy: 0,
            password_hash: None,
            signature: "c2ln".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = SqliteStore::open_memory().unwrap();

        let outcome = store.upsert(make_record("echo", "AA", "K1")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let record = store.get_by_name("echo").await.unwrap().unwrap();
        assert_eq!(record.public_key, "AA");
        assert_eq!(record.auth_key, "K1");
        assert!(record.updated_at > 0);

        let record = store.get_by_key("AA").await.unwrap().unwrap();
        assert_eq!(record.name, "echo");
        assert!(store.get_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_republish_by_owner_updates() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();

        let mut again = make_record("echo", "BB", "K1");
        again.bio = "updated".to_string();
        let outcome = store.upsert(again).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let record = store.get_by_name("echo").await.unwrap().unwrap();
        assert_eq!(record.public_key, "BB");
        assert_eq!(record.bio, "updated");
    }

    #[tokio::test]
    async fn test_name_taken_by_other_owner() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();

        let outcome = store.upsert(make_record("echo", "BB", "K2")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::NameTaken);

        // Untouched.
        let record = store.get_by_name("echo").await.unwrap().unwrap();
        assert_eq!(record.public_key, "AA");
    }

    #[tokio::test]
    async fn test_duplicate_identity_under_new_name() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();

        let outcome = store
            .upsert(make_record("foxtrot", "AA", "K2"))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::DuplicateIdentity);
        assert!(store.get_by_name("foxtrot").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_hash_preserved_on_republish() {
        let store = SqliteStore::open_memory().unwrap();

        let mut with_password = make_record("echo", "AA", "K1");
        with_password.password_hash = Some(vec![1, 2, 3]);
        store.upsert(with_password).await.unwrap();

        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();
        let record = store.get_by_name("echo").await.unwrap().unwrap();
        assert_eq!(record.password_hash, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_release() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();

        let deleted = store.release("K1").await.unwrap().unwrap();
        assert_eq!(deleted.name, "echo");
        assert!(store.get_by_name("echo").await.unwrap().is_none());

        assert!(store.release("K1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_skips_private_records() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .upsert(make_record("alpha-echo", "AA", "K1"))
            .await
            .unwrap();
        let mut private = make_record("bravo-echo", "BB", "K2");
        private.privacy = 1;
        store.upsert(private).await.unwrap();

        let hits = store.search("echo", 0, 30).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "alpha-echo");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = SqliteStore::open_memory().unwrap();
        store.upsert(make_record("echo", "AA", "K1")).await.unwrap();

        assert!(store.search("%", 0, 30).await.unwrap().is_empty());
        assert!(store.search("_", 0, 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert(make_record("echo", "AA", "K1")).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let record = store.get_by_name("echo").await.unwrap().unwrap();
        assert_eq!(record.public_key, "AA");
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = SqliteStore::open_memory().unwrap();
        for i in 0..5 {
            store
                .upsert(make_record(
                    &format!("user{}", i),
                    &format!("K{}", i),
                    &format!("A{}", i),
                ))
                .await
                .unwrap();
        }

        let first = store.list_page(0, 2).await.unwrap();
        let second = store.list_page(1, 2).await.unwrap();
        let third = store.list_page(2, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        assert_eq!(first[0].name, "user0");
        assert_eq!(third[0].name, "user4");

        assert_eq!(store.count_records().await.unwrap(), 5);
    }
}
