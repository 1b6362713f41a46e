//! Response-binding signatures over client-supplied random bytes.
//!
//! A client may attach `memorabilia` to the outer envelope: base64 of
//! exactly 64 random bytes. The authority signs those bytes and every
//! response for the request carries the signature, letting the client
//! confirm the response came from this authority for this request.
//!
//! The feature is best-effort: malformed input yields no signature and
//! must never fail the request, so extraction has its own narrow error
//! type that callers always swallow into `None`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use signpost_core::Authority;

/// Required length of the client's random bytes.
pub const SIGNED_RANDOM_LENGTH: usize = 64;

#[derive(Debug, Error)]
enum MemorabiliaError {
    #[error("no memorabilia field")]
    Missing,

    #[error("memorabilia is not a base64 string")]
    NotBase64,

    #[error("memorabilia is {0} bytes, expected 64")]
    WrongLength(usize),
}

fn extract(envelope: &Value) -> Result<[u8; SIGNED_RANDOM_LENGTH], MemorabiliaError> {
    let field = envelope
        .get("memorabilia")
        .and_then(Value::as_str)
        .ok_or(MemorabiliaError::Missing)?;
    let raw = BASE64
        .decode(field)
        .map_err(|_| MemorabiliaError::NotBase64)?;
    let len = raw.len();
    raw.try_into()
        .map_err(|_| MemorabiliaError::WrongLength(len))
}

/// Produce the response-binding signature for a request envelope.
///
/// Returns base64 of the authority's detached signature over the 64
/// memorabilia bytes, or `None` when the field is absent or malformed.
pub fn bind_response(envelope: &Value, authority: &Authority) -> Option<String> {
    match extract(envelope) {
        Ok(random) => Some(authority.sign(&random).to_base64()),
        Err(MemorabiliaError::Missing) => None,
        Err(e) => {
            debug!("ignoring memorabilia: {e}");
            None
        }
    }
}
