//! The 76-hex-character identity string.
//!
//! Layout: `public_key (32 bytes) ‖ pin (4 bytes) ‖ checksum (2 bytes)`,
//! hex encoded. The checksum must equal the XOR-fold of the key and pin.

use crate::checksum::checksum_hex;
use crate::error::CoreError;

/// Length of the identity string in hex characters.
pub const IDENTITY_HEX_LEN: usize = 76;

/// A parsed, checksum-verified identity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    public_key: [u8; 32],
    pin: [u8; 4],
    checksum: [u8; 2],
}

impl Identity {
    /// Parse and verify an identity string.
    ///
    /// Rejects anything that is not exactly 76 hex characters or whose
    /// embedded checksum does not match the key and pin.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.len() != IDENTITY_HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidIdentity);
        }
        let raw = hex::decode(s).map_err(|_| CoreError::InvalidIdentity)?;

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&raw[..32]);
        let mut pin = [0u8; 4];
        pin.copy_from_slice(&raw[32..36]);
        let checksum = [raw[36], raw[37]];

        let expected = checksum_hex(&raw[..36]);
        if expected != hex::encode_upper(checksum) {
            return Err(CoreError::InvalidIdentity);
        }

        Ok(Self {
            public_key,
            pin,
            checksum,
        })
    }

    /// True iff `s` is a well-formed identity string with a valid checksum.
    pub fn validate(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Construct an identity from a key and pin, computing the checksum.
    pub fn from_parts(public_key: [u8; 32], pin: [u8; 4]) -> Self {
        let mut buf = [0u8; 36];
        buf[..32].copy_from_slice(&public_key);
        buf[32..].copy_from_slice(&pin);
        let check = crate::checksum::xor_fold(&buf, [0, 0]);
        Self {
            public_key,
            pin,
            checksum: check,
        }
    }

    /// The embedded encryption public key, uppercase hex (64 chars).
    pub fn public_key_hex(&self) -> String {
        hex::encode_upper(self.public_key)
    }

    /// The pin, uppercase hex (8 chars).
    pub fn pin_hex(&self) -> String {
        hex::encode_upper(self.pin)
    }

    /// The checksum, uppercase hex (4 chars).
    pub fn checksum_hex(&self) -> String {
        hex::encode_upper(self.checksum)
    }

    /// The raw public key bytes.
    pub fn public_key_bytes(&self) -> &[u8; 32] {
        &self.public_key
    }

    /// Render the full 76-character uppercase identity string.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(IDENTITY_HEX_LEN);
        s.push_str(&self.public_key_hex());
        s.push_str(&self.pin_hex());
        s.push_str(&self.checksum_hex());
        s
    }
}

/// True iff `s` is exactly 64 hex characters (a bare public key).
pub fn is_valid_key_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
