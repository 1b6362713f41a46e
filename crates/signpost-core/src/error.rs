//! Error types for the Signpost core.

use thiserror::Error;

/// Core errors that can occur during cryptographic and parsing operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Envelope could not be opened. Deliberately carries no detail about
    /// which stage failed (key parse, nonce length, tag check) so callers
    /// cannot build a decryption oracle out of the response.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed identity string")]
    InvalidIdentity,

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Validation errors for request field content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name contains a disallowed character")]
    InvalidCharacter,

    #[error("name is reserved")]
    InvalidName,

    #[error("field exceeds its size limit")]
    Oversized,

    #[error("timestamp outside the freshness window")]
    Stale,
}
