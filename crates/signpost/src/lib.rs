//! # Signpost
//!
//! The Signpost directory service: clients register human-readable
//! names bound to cryptographic identities through encrypted request
//! envelopes, and the authority signs every stored binding.
//!
//! This crate wires the protocol ([`signpost_proto`]) onto a store
//! ([`signpost_store`]) behind one transport-agnostic entry point,
//! [`Directory::handle`]. It owns the service-only concerns: the
//! per-source rate limiter, management passwords, configuration, and
//! authority key persistence.

pub mod config;
pub mod error;
pub mod keyfile;
pub mod password;
pub mod ratelimit;
pub mod service;

pub use config::DirectoryConfig;
pub use error::{Result, ServiceError};
pub use keyfile::load_or_generate;
pub use ratelimit::RateLimiter;
pub use service::{Directory, RequestContext, PAGE_SIZE};
