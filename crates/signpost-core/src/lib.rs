//! # Signpost Core
//!
//! Pure primitives for the Signpost directory: identity strings, the
//! authority keypair, envelope cryptography, and record signing.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Identity`] - A 76-hex-character identity string (key, pin, checksum)
//! - [`Authority`] - The directory operator's encryption + signing identity
//! - [`Record`] - A stored name-to-identity binding
//!
//! ## Canonical signing
//!
//! Every stored record carries an authority signature over a fixed byte
//! layout. See [`canonical`] module.

pub mod authority;
pub mod canonical;
pub mod checksum;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod record;
pub mod validation;

pub use authority::Authority;
pub use canonical::{canonical_record_bytes, sign_record, verify_record_signature};
pub use checksum::{checksum_hex, xor_fold};
pub use crypto::{
    BoxNonce, Ed25519Signature, Ed25519VerifyKey, SigningKeypair, X25519PublicKey,
    X25519StaticSecret,
};
pub use error::{CoreError, ValidationError};
pub use identity::{is_valid_key_hex, Identity};
pub use record::Record;
pub use validation::{is_fresh, normalize_bio, validate_name, BIO_LIMIT, NAME_LIMIT_HARD};
