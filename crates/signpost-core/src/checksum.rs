//! XOR-fold checksum embedded in identity strings.
//!
//! This is a structural self-consistency check, not a security control.
//! The byte-level behavior (alternating two-byte accumulator, fixed zero
//! starting value) must match what deployed clients already compute, so
//! externally issued identity strings validate identically here.

/// Fold raw bytes into a two-byte accumulator.
///
/// Each byte is XORed into the accumulator slot selected by its position
/// modulo 2, starting from `iv`.
pub fn xor_fold(data: &[u8], iv: [u8; 2]) -> [u8; 2] {
    let mut acc = iv;
    for (i, byte) in data.iter().enumerate() {
        acc[i % 2] ^= byte;
    }
    acc
}

/// Compute the checksum of raw bytes as four uppercase hex digits.
///
/// Uses the fixed `(0, 0)` starting value shared with deployed clients.
pub fn checksum_hex(data: &[u8]) -> String {
    let acc = xor_fold(data, [0, 0]);
    hex::encode_upper(acc)
}
