//! The sealed request envelope and its encrypted inner payloads.
//!
//! Inbound shape: `{"public_key": hex-32B, "nonce": base64-24B,
//! "encrypted": base64}`. Validation short-circuits on the first failing
//! stage, but every stage maps to the same `BadPayload` error so the
//! response never reveals which check rejected the request.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use signpost_core::{Authority, BoxNonce, X25519PublicKey};

use crate::error::ProtoError;

/// The outer encrypted-request fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SealedEnvelope {
    pub public_key: String,
    pub nonce: String,
    pub encrypted: String,
}

impl SealedEnvelope {
    /// Extract the sealed fields from an envelope object.
    ///
    /// All three fields must be present and strings.
    pub fn from_value(envelope: &Value) -> Result<Self, ProtoError> {
        serde_json::from_value(envelope.clone()).map_err(|_| {
            warn!("envelope field typecheck failed");
            ProtoError::BadPayload
        })
    }

    /// The client's envelope key as stored on records, uppercase hex.
    pub fn auth_key(&self) -> String {
        self.public_key.to_uppercase()
    }

    /// Decrypt and parse the inner payload.
    ///
    /// Stages, in order: hex-decode the client key, base64-decode nonce
    /// and ciphertext, box-open, parse UTF-8 JSON. Each failure logs its
    /// stage server-side but returns the uniform `BadPayload`.
    pub fn open(&self, authority: &Authority) -> Result<Value, ProtoError> {
        let client_key = X25519PublicKey::from_hex(&self.public_key).map_err(|_| {
            warn!("rejecting request: client public key malformed");
            ProtoError::BadPayload
        })?;

        let nonce_raw = BASE64.decode(&self.nonce).map_err(|_| {
            warn!("rejecting request: nonce not base64");
            ProtoError::BadPayload
        })?;
        let nonce = BoxNonce::from_slice(&nonce_raw).map_err(|_| {
            warn!("rejecting request: nonce wrong length");
            ProtoError::BadPayload
        })?;

        let ciphertext = BASE64.decode(&self.encrypted).map_err(|_| {
            warn!("rejecting request: ciphertext not base64");
            ProtoError::BadPayload
        })?;

        let clear = authority
            .open_envelope(&client_key, &nonce, &ciphertext)
            .map_err(|_| {
                warn!("rejecting request: envelope did not open");
                ProtoError::BadPayload
            })?;

        serde_json::from_slice(&clear).map_err(|_| {
            warn!("rejecting request: inner payload not JSON");
            ProtoError::BadPayload
        })
    }
}

/// Inner payload of a publish request.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishPayload {
    pub tox_id: String,
    pub name: String,
    pub timestamp: i64,
    pub privacy: i64,
    pub bio: String,
}

/// Inner payload of an unpublish request.
#[derive(Debug, Clone, Deserialize)]
pub struct UnpublishPayload {
    pub public_key: String,
    pub timestamp: i64,
}
