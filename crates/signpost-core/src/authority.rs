//! The directory authority's long-term identity.
//!
//! One 32-byte seed backs both keypairs: the X25519 encryption secret is
//! the seed itself, and the Ed25519 signing key is derived from the same
//! bytes. Clients fetch both public keys out-of-band before sending their
//! first encrypted request.

use crate::crypto::{
    BoxNonce, Ed25519Signature, Ed25519VerifyKey, SigningKeypair, X25519PublicKey,
    X25519StaticSecret,
};
use crate::error::CoreError;

/// The authority's encryption + signing identity.
pub struct Authority {
    seed: [u8; 32],
    secret: X25519StaticSecret,
    signing: SigningKeypair,
}

impl Authority {
    /// Build both keypairs from one seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            seed,
            secret: X25519StaticSecret::from_bytes(seed),
            signing: SigningKeypair::from_seed(&seed),
        }
    }

    /// Generate a fresh authority identity.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// The seed bytes, for persistence.
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// The encryption public key, uppercase hex.
    pub fn public_encryption_key(&self) -> String {
        self.secret.public_key().to_hex()
    }

    /// The signature verify key, uppercase hex.
    pub fn public_verify_key(&self) -> String {
        self.verify_key().to_hex()
    }

    /// The raw verify key.
    pub fn verify_key(&self) -> Ed25519VerifyKey {
        self.signing.verify_key()
    }

    /// Open a boxed envelope from a client.
    ///
    /// Every failure cause (bad key, bad nonce, bad tag) collapses to
    /// [`CoreError::DecryptionFailed`].
    pub fn open_envelope(
        &self,
        client: &X25519PublicKey,
        nonce: &BoxNonce,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CoreError> {
        self.secret.envelope_key(client).open(nonce, ciphertext)
    }

    /// Seal plaintext for a client.
    ///
    /// The symmetric counterpart of [`open_envelope`](Self::open_envelope).
    /// No response path encrypts today; the primitive is shared with the
    /// client side of the protocol.
    pub fn seal_for(
        &self,
        client: &X25519PublicKey,
        nonce: &BoxNonce,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CoreError> {
        self.secret.envelope_key(client).seal(nonce, plaintext)
    }

    /// Detached signature over arbitrary bytes with the long-term key.
    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.signing.sign(message)
    }
}

impl std::fmt::Debug for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authority")
            .field("encryption_key", &self.public_encryption_key())
            .field("verify_key", &self.public_verify_key())
            .finish()
    }
}
