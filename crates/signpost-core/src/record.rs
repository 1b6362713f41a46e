//! The stored name-to-identity binding.

/// A directory record as held by the store.
///
/// The signature is always recomputed server-side at write time; it is
/// never accepted from client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Lowercase registered name. Unique, case-insensitive primary key.
    pub name: String,
    /// The identity's encryption key, 64 uppercase hex chars. Unique
    /// among live records.
    pub public_key: String,
    /// The envelope key that owns this record, 64 hex chars.
    pub auth_key: String,
    /// Pin, 8 hex chars or empty.
    pub pin: String,
    /// Checksum, 4 hex chars.
    pub checksum: String,
    /// Bio text, newlines already normalized to spaces.
    pub bio: String,
    /// 0 = discoverable in search and listings, anything else = hidden.
    pub privacy: i64,
    /// Optional `salt(16) ‖ SHA-512(salt ‖ password)` digest.
    pub password_hash: Option<Vec<u8>>,
    /// Authority signature over the canonical record bytes, base64.
    pub signature: String,
    /// Unix seconds, stamped at write.
    pub updated_at: i64,
}

impl Record {
    /// Reconstruct the full identity string from the stored parts.
    pub fn identity_string(&self) -> String {
        let mut s = String::with_capacity(76);
        s.push_str(&self.public_key);
        s.push_str(&self.pin);
        s.push_str(&self.checksum);
        s
    }

    /// Whether this record may appear in search results and listings.
    pub fn is_discoverable(&self) -> bool {
        self.privacy == 0
    }
}
