//! Proptest strategies for directory values.

use proptest::prelude::*;

use signpost_core::Identity;

/// Valid identity strings: random key and pin, correct checksum.
pub fn arb_identity() -> impl Strategy<Value = String> {
    (
        proptest::array::uniform32(any::<u8>()),
        proptest::array::uniform4(any::<u8>()),
    )
        .prop_map(|(key, pin)| Identity::from_parts(key, pin).to_hex())
}

/// Names that pass validation: 1 to 63 bytes, no disallowed characters,
/// not on the reserved list.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z0-9_.-]{1,63}".prop_filter("reserved name", |name| {
        !signpost_core::validation::DISALLOWED_NAMES.contains(&name.as_str())
    })
}

/// Arbitrary bios within the size limit, newlines included so the
/// normalization path gets exercised.
pub fn arb_bio() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \r\n]{0,200}"
}
