//! Canonical record bytes and the authority signature over them.
//!
//! The signed layout is fixed: `name_utf8 ‖ public_key_raw ‖ pin_raw ‖
//! checksum_raw`, with the pin contributing zero bytes when empty. Third
//! parties verify this against the authority's published verify key.

use crate::authority::Authority;
use crate::crypto::{Ed25519Signature, Ed25519VerifyKey};
use crate::error::CoreError;
use crate::record::Record;

/// Build the byte sequence a record signature covers.
///
/// `public_key`, `pin`, and `checksum` are hex strings as stored on the
/// record; they are decoded to raw bytes before concatenation.
pub fn canonical_record_bytes(
    name: &str,
    public_key: &str,
    pin: &str,
    checksum: &str,
) -> Result<Vec<u8>, CoreError> {
    let key_raw = hex::decode(public_key).map_err(|_| CoreError::InvalidIdentity)?;
    let pin_raw = if pin.is_empty() {
        Vec::new()
    } else {
        hex::decode(pin).map_err(|_| CoreError::InvalidIdentity)?
    };
    let check_raw = hex::decode(checksum).map_err(|_| CoreError::InvalidIdentity)?;

    let mut buf = Vec::with_capacity(name.len() + key_raw.len() + pin_raw.len() + check_raw.len());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&key_raw);
    buf.extend_from_slice(&pin_raw);
    buf.extend_from_slice(&check_raw);
    Ok(buf)
}

/// Sign a record's canonical bytes, returning the base64 signature.
///
/// Called on every write; client-supplied signatures are discarded.
pub fn sign_record(
    authority: &Authority,
    name: &str,
    public_key: &str,
    pin: &str,
    checksum: &str,
) -> Result<String, CoreError> {
    let message = canonical_record_bytes(name, public_key, pin, checksum)?;
    Ok(authority.sign(&message).to_base64())
}

/// Verify a stored record's signature against a verify key.
pub fn verify_record_signature(
    verify_key: &Ed25519VerifyKey,
    record: &Record,
) -> Result<(), CoreError> {
    let message = canonical_record_bytes(
        &record.name,
        &record.public_key,
        &record.pin,
        &record.checksum,
    )?;
    let signature = Ed25519Signature::from_base64(&record.signature)?;
    verify_key.verify(&message, &signature)
}
