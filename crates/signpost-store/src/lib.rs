//! # Signpost Store
//!
//! Persistence for the Signpost directory: the [`DirectoryStore`] trait,
//! the SQLite implementation (primary), and an in-memory implementation
//! for tests.
//!
//! The store is the sole owner of record lifetime. Every mutation runs
//! its uniqueness checks and its write inside one exclusive critical
//! section; lookups and search read the latest committed state.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DirectoryStore, NewRecord, UpsertOutcome};
