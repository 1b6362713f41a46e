//! Service-level errors and their mapping onto wire status codes.

use thiserror::Error;

use signpost_core::ValidationError;
use signpost_proto::{ProtoError, StatusCode};
use signpost_store::StoreError;

/// Everything that can make a request fail.
///
/// Each variant maps onto exactly one wire status code; the mapping is
/// the only place response codes are chosen.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("method unsupported")]
    MethodUnsupported,

    #[error("refusing to process request over an insecure transport")]
    NotSecure,

    #[error("bad payload")]
    BadPayload,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("name is taken")]
    NameTaken,

    #[error("identity key is already registered")]
    DuplicateIdentity,

    #[error("disallowed character in name")]
    InvalidCharacter,

    #[error("name is not allowed")]
    InvalidName,

    #[error("no such user")]
    NoSuchUser,

    #[error("bad password")]
    BadPassword,

    #[error("lookup failed")]
    LookupFailed,

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// The status code this failure answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodUnsupported => StatusCode::MethodUnsupported,
            Self::NotSecure => StatusCode::NotSecure,
            Self::BadPayload => StatusCode::BadPayload,
            Self::RateLimited => StatusCode::RateLimited,
            Self::NameTaken => StatusCode::NameTaken,
            Self::DuplicateIdentity => StatusCode::DuplicateIdentity,
            Self::InvalidCharacter => StatusCode::InvalidCharacter,
            Self::InvalidName => StatusCode::InvalidName,
            Self::NoSuchUser => StatusCode::NoSuchUser,
            Self::BadPassword => StatusCode::BadPassword,
            // Internal lookup machinery failed; same code the original
            // service used for backend trouble.
            Self::LookupFailed | Self::Store(_) => StatusCode::LookupFailed,
        }
    }
}

impl From<ProtoError> for ServiceError {
    fn from(e: ProtoError) -> Self {
        match e {
            ProtoError::BadPayload => Self::BadPayload,
            ProtoError::UnrecognizedAction(_) => Self::MethodUnsupported,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidCharacter => Self::InvalidCharacter,
            ValidationError::InvalidName => Self::InvalidName,
            ValidationError::Oversized | ValidationError::Stale => Self::BadPayload,
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
