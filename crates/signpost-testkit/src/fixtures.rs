//! Deterministic fixtures for directory tests.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Map, Value};

use signpost_core::{Authority, BoxNonce, Identity, X25519PublicKey, X25519StaticSecret};
use signpost_store::NewRecord;

/// A test client: an envelope keypair plus helpers to seal requests
/// the way a real client would.
pub struct Client {
    secret: X25519StaticSecret,
}

impl Client {
    /// A fresh random client.
    pub fn generate() -> Self {
        Self {
            secret: X25519StaticSecret::generate(),
        }
    }

    /// A deterministic client for reproducible failures.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            secret: X25519StaticSecret::from_bytes(seed),
        }
    }

    /// The envelope key as the service stores it: uppercase hex.
    pub fn auth_key(&self) -> String {
        self.secret.public_key().to_hex()
    }

    /// An identity string whose embedded key is this client's key.
    ///
    /// Convenient for publishes where the identity and envelope key
    /// belong to the same party, as they do for real clients.
    pub fn identity(&self, pin: [u8; 4]) -> Identity {
        Identity::from_parts(*self.secret.public_key().as_bytes(), pin)
    }

    /// Seal an inner payload for the authority.
    ///
    /// Returns the three outer envelope fields.
    pub fn seal(&self, authority: &Authority, payload: &Value) -> Value {
        let authority_pk = X25519PublicKey::from_hex(&authority.public_encryption_key())
            .expect("authority key is valid hex");
        let nonce = BoxNonce::generate();
        let ciphertext = self
            .secret
            .envelope_key(&authority_pk)
            .seal(&nonce, payload.to_string().as_bytes())
            .expect("sealing cannot fail");

        json!({
            "public_key": self.secret.public_key().to_hex(),
            "nonce": BASE64.encode(nonce.as_bytes()),
            "encrypted": BASE64.encode(ciphertext),
        })
    }

    /// Build a complete request body: action tag, sealed fields, and
    /// any extra cleartext fields.
    pub fn request(&self, authority: &Authority, action: i64, payload: &Value) -> String {
        let mut body = Map::new();
        body.insert("action".to_string(), Value::from(action));
        if let Value::Object(sealed) = self.seal(authority, payload) {
            body.extend(sealed);
        }
        Value::Object(body).to_string()
    }

    /// A ready-to-send publish body for `name` at `timestamp`.
    pub fn publish_request(&self, authority: &Authority, name: &str, timestamp: i64) -> String {
        let payload = json!({
            "tox_id": self.identity([0, 0, 0, 0]).to_hex(),
            "name": name,
            "timestamp": timestamp,
            "privacy": 0,
            "bio": "",
        });
        self.request(authority, 1, &payload)
    }
}

/// Base64 memorabilia field content for the given random bytes.
pub fn memorabilia_for(random: &[u8; 64]) -> String {
    BASE64.encode(random)
}

/// A store-level record fixture with a distinct identity per key seed.
pub fn new_record(name: &str, seed: u8) -> NewRecord {
    let identity = Identity::from_parts([seed; 32], [0, 0, 0, seed]);
    NewRecord {
        name: name.to_string(),
        public_key: identity.public_key_hex(),
        auth_key: identity.public_key_hex(),
        pin: identity.pin_hex(),
        checksum: identity.checksum_hex(),
        bio: String::new(),
        privacy: 0,
        password_hash: None,
        signature: "c2lnbmF0dXJl".to_string(),
    }
}
