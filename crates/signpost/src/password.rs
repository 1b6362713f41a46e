//! Registration passwords: generation and salted-hash verification.
//!
//! First-time registrations get a generated pronounceable password that
//! lets the owner manage the record through the web form later. Only the
//! salted SHA-512 hash is stored.

use rand::Rng;
use sha2::{Digest, Sha512};

const CONSONANTS: &[u8] = b"bcdfghjklmnprstvwz";
const VOWELS: &[u8] = b"aeiou";

/// Bytes of salt prepended to the stored hash.
pub const SALT_LENGTH: usize = 16;

/// Generate a pronounceable password: 4 to 6 consonant-vowel syllables.
pub fn generate_password() -> String {
    generate_password_with(&mut rand::thread_rng())
}

fn generate_password_with<R: Rng>(rng: &mut R) -> String {
    let syllables = rng.gen_range(4..=6);
    let mut out = String::with_capacity(syllables * 2);
    for _ in 0..syllables {
        out.push(CONSONANTS[rng.gen_range(0..CONSONANTS.len())] as char);
        out.push(VOWELS[rng.gen_range(0..VOWELS.len())] as char);
    }
    out
}

/// Hash a password with a fresh random salt.
///
/// Stored layout: `salt (16 bytes) ‖ SHA-512(salt ‖ password)`.
pub fn hash_password(password: &str) -> Vec<u8> {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill(&mut salt);
    hash_with_salt(&salt, password)
}

fn hash_with_salt(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());

    let mut out = Vec::with_capacity(SALT_LENGTH + 64);
    out.extend_from_slice(salt);
    out.extend_from_slice(&hasher.finalize());
    out
}

/// Check a candidate password against a stored salted hash.
pub fn verify_password(stored: &[u8], candidate: &str) -> bool {
    if stored.len() != SALT_LENGTH + 64 {
        return false;
    }
    let recomputed = hash_with_salt(&stored[..SALT_LENGTH], candidate);
    // XOR-accumulate instead of short-circuiting on the first mismatch.
    stored
        .iter()
        .zip(recomputed.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
