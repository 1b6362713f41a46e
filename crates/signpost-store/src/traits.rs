//! The DirectoryStore trait: the persistence seam for the directory.

use async_trait::async_trait;

use signpost_core::Record;

use crate::error::Result;

/// All fields of a record as prepared by the service for a write.
///
/// `password_hash` is `None` when the registration should keep whatever
/// hash an existing row already has (encrypted-API publishes never carry
/// a password).
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
    pub public_key: String,
    pub auth_key: String,
    pub pin: String,
    pub checksum: String,
    pub bio: String,
    pub privacy: i64,
    pub password_hash: Option<Vec<u8>>,
    pub signature: String,
}

/// Outcome of an upsert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was created.
    Created,
    /// An existing row owned by the same client was overwritten.
    Updated,
    /// The name exists and is owned by a different client.
    NameTaken,
    /// The identity key is already registered under another name.
    DuplicateIdentity,
}

/// Storage abstraction for directory records.
///
/// The two uniqueness checks in `upsert` and the write itself must run
/// under one exclusive critical section per store, so that concurrent
/// registrations cannot both pass the checks.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch a record by its exact (lowercase) name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Record>>;

    /// Fetch a record by its identity public key (uppercase hex).
    async fn get_by_key(&self, public_key: &str) -> Result<Option<Record>>;

    /// Create or overwrite a registration.
    ///
    /// Rejects with `DuplicateIdentity` when the identity key is already
    /// bound to a different name, and with `NameTaken` when the name is
    /// owned by a different auth key. A republish by the owner replaces
    /// every mutable field; `password_hash = None` preserves the stored
    /// hash.
    async fn upsert(&self, record: NewRecord) -> Result<UpsertOutcome>;

    /// Delete the record owned by the given auth key.
    ///
    /// Returns the deleted record, or `None` when the key owns nothing.
    async fn release(&self, auth_key: &str) -> Result<Option<Record>>;

    /// Case-insensitive substring search over discoverable records.
    ///
    /// Results are ordered by name; `page` is zero-based.
    async fn search(&self, query: &str, page: u32, per_page: u32) -> Result<Vec<Record>>;

    /// One page of discoverable records ordered by name.
    async fn list_page(&self, page: u32, per_page: u32) -> Result<Vec<Record>>;

    /// Total number of records, discoverable or not.
    async fn count_records(&self) -> Result<u64>;
}
