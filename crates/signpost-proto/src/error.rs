//! Error types for the wire protocol.

use thiserror::Error;

/// Protocol-level request failures.
///
/// Envelope failures deliberately collapse into [`ProtoError::BadPayload`]:
/// a caller must not be able to tell a key-parse failure from a tag-check
/// failure from the response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("bad payload")]
    BadPayload,

    #[error("unrecognized action: {0}")]
    UnrecognizedAction(i64),
}
