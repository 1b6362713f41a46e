//! # Signpost Proto
//!
//! Wire protocol for the Signpost directory: the outer request envelope,
//! the sealed (encrypted) payload shape, action dispatch, response codes,
//! and the memorabilia response-binding signature.
//!
//! Everything on the wire is JSON. The only binary framing is inside the
//! sealed envelope fields, carried as hex (keys) and base64 (nonce,
//! ciphertext, memorabilia).

pub mod action;
pub mod envelope;
pub mod error;
pub mod memorabilia;
pub mod response;

pub use action::{parse_request, Action};
pub use envelope::{PublishPayload, SealedEnvelope, UnpublishPayload};
pub use error::ProtoError;
pub use memorabilia::bind_response;
pub use response::{Response, StatusCode};
