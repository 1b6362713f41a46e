//! In-memory implementation of the DirectoryStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use signpost_core::Record;

use crate::error::Result;
use crate::traits::{DirectoryStore, NewRecord, UpsertOutcome};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// the write lock is the upsert critical section.
pub struct MemoryStore {
    /// Records keyed by name. BTreeMap keeps name ordering for free.
    records: RwLock<BTreeMap<String, Record>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn get_by_name(&self, name: &str) -> Result<Option<Record>> {
        let records = self.records.read().unwrap();
        Ok(records.get(name).cloned())
    }

    async fn get_by_key(&self, public_key: &str) -> Result<Option<Record>> {
        let records = self.records.read().unwrap();
        Ok(records
            .values()
            .find(|r| r.public_key == public_key)
            .cloned())
    }

    async fn upsert(&self, record: NewRecord) -> Result<UpsertOutcome> {
        let mut records = self.records.write().unwrap();

        if let Some(existing) = records.values().find(|r| r.public_key == record.public_key) {
            if existing.name != record.name {
                return Ok(UpsertOutcome::DuplicateIdentity);
            }
        }

        let (outcome, kept_hash) = match records.get(&record.name) {
            Some(existing) if existing.auth_key != record.auth_key => {
                return Ok(UpsertOutcome::NameTaken)
            }
            Some(existing) => (UpsertOutcome::Updated, existing.password_hash.clone()),
            None => (UpsertOutcome::Created, None),
        };

        let password_hash = record.password_hash.or(kept_hash);
        records.insert(
            record.name.clone(),
            Record {
                name: record.name,
                public_key: record.public_key,
                auth_key: record.auth_key,
                pin: record.pin,
                checksum: record.checksum,
                bio: record.bio,
                privacy: record.privacy,
                password_hash,
                signature: record.signature,
                updated_at: now_secs(),
            },
        );

        Ok(outcome)
    }

    async fn release(&self, auth_key: &str) -> Result<Option<Record>> {
        let mut records = self.records.write().unwrap();

        let name = records
            .values()
            .find(|r| r.auth_key == auth_key)
            .map(|r| r.name.clone());

        Ok(name.and_then(|n| records.remove(&n)))
    }

    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Record>> {
        let query = query.to_lowercase();
        let records = self.records.read().unwrap();

        Ok(records
            .values()
            .filter(|r| r.is_discoverable() && r.name.contains(&query))
            .skip((page as usize) * (per_page as usize))
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>> {
        let records = self.records.read().unwrap();

        Ok(records
            .values()
            .filter(|r| r.is_discoverable())
            .skip((page as usize) * (per_page as usize))
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn count_records(&self) -> Result<u64> {
        let records = self.records.read().unwrap();
        Ok(records.len() as u64)
    }
}
