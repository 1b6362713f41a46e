//! # Signpost Testkit
//!
//! Shared test fixtures and proptest generators for the Signpost
//! workspace: client keypairs that can seal request envelopes, valid
//! identity strings, and store record builders.
//!
//! Test-only crate; nothing here ships in the service.

pub mod fixtures;
pub mod generators;

pub use fixtures::{memorabilia_for, new_record, Client};
