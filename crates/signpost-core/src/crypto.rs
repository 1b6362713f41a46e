//! Cryptographic primitives for the Signpost directory.
//!
//! Wraps Ed25519 signing, X25519 key agreement, and XChaCha20-Poly1305
//! authenticated encryption with strong types. The envelope construction
//! is a boxed AEAD: X25519 Diffie-Hellman between the two parties, a
//! Blake3 derive-key step for domain separation, then XChaCha20-Poly1305
//! under the caller-supplied 24-byte nonce.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::CoreError;

/// Domain separator for envelope key derivation.
const ENVELOPE_KDF_CONTEXT: &str = "signpost-envelope-v1";

/// An X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Uppercase hex encoding, the form distributed to clients.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parse from hex. Accepts either case; requires exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidPublicKey)?;
        Ok(Self(arr))
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Pub({})", &self.to_hex()[..16])
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

/// An X25519 static secret used for envelope key agreement.
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }

    /// Derive the shared envelope key with a peer.
    ///
    /// Both directions of the box use the same key, so either party can
    /// seal or open given the other's public key.
    pub fn envelope_key(&self, peer: &X25519PublicKey) -> EnvelopeKey {
        let shared = self.0.diffie_hellman(&peer.to_dalek());
        let mut hasher = blake3::Hasher::new_derive_key(ENVELOPE_KDF_CONTEXT);
        hasher.update(shared.as_bytes());
        EnvelopeKey(*hasher.finalize().as_bytes())
    }
}

/// A 24-byte nonce for the boxed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxNonce(pub [u8; 24]);

impl BoxNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Parse from a byte slice, rejecting any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 24] = bytes.try_into().map_err(|_| CoreError::DecryptionFailed)?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

/// The symmetric key derived for one peer pair.
#[derive(Clone)]
pub struct EnvelopeKey([u8; 32]);

impl EnvelopeKey {
    /// Seal plaintext under the given nonce.
    pub fn seal(&self, nonce: &BoxNonce, plaintext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let cipher = XChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        cipher
            .encrypt(XNonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| CoreError::EncodingError(e.to_string()))
    }

    /// Open ciphertext under the given nonce.
    ///
    /// Any integrity failure collapses to [`CoreError::DecryptionFailed`].
    pub fn open(&self, nonce: &BoxNonce, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let cipher = XChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|_| CoreError::DecryptionFailed)?;
        cipher
            .decrypt(XNonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| CoreError::DecryptionFailed)
    }
}

/// A 32-byte Ed25519 verify key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519VerifyKey(pub [u8; 32]);

impl Ed25519VerifyKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Uppercase hex encoding for distribution.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Verify a detached signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CoreError> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;
        let sig = Signature::from_bytes(&signature.0);
        key.verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for Ed25519VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Verify({})", &self.to_hex()[..16])
    }
}

/// A 64-byte detached Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Base64 encoding, the form stored on records and sent on the wire.
    pub fn to_base64(&self) -> String {
        use base64::{engine::general_purpose::STANDARD, Engine};
        STANDARD.encode(self.0)
    }

    /// Parse from base64, requiring exactly 64 raw bytes.
    pub fn from_base64(s: &str) -> Result<Self, CoreError> {
        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| CoreError::InvalidSignature)?;
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CoreError::InvalidSignature)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &hex::encode(&self.0[..8]))
    }
}

/// The authority's signing keypair.
#[derive(Clone)]
pub struct SigningKeypair {
    signing_key: SigningKey,
}

impl SigningKeypair {
    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Get the verify key.
    pub fn verify_key(&self) -> Ed25519VerifyKey {
        Ed25519VerifyKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message. Deterministic given identical input.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKeypair({:?})", self.verify_key())
    }
}
