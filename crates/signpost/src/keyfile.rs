//! Authority seed persistence.
//!
//! The whole authority identity is one 32-byte seed stored as a hex
//! line on disk. Both the encryption secret and the signing key are
//! derived from it, so losing the file means losing the authority.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::info;

use signpost_core::Authority;

/// Load the authority from a seed file, generating one if absent.
pub fn load_or_generate(path: impl AsRef<Path>) -> anyhow::Result<Authority> {
    let path = path.as_ref();

    let authority = if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading authority seed {}", path.display()))?;
        let seed_bytes = hex::decode(raw.trim())
            .with_context(|| format!("decoding authority seed {}", path.display()))?;
        let seed: [u8; 32] = match seed_bytes.try_into() {
            Ok(seed) => seed,
            Err(bytes) => bail!(
                "authority seed {} is {} bytes, expected 32",
                path.display(),
                bytes.len()
            ),
        };
        Authority::from_seed(seed)
    } else {
        info!(path = %path.display(), "no authority seed found, generating one");
        let authority = Authority::generate();
        fs::write(path, hex::encode(authority.seed()))
            .with_context(|| format!("writing authority seed {}", path.display()))?;
        authority
    };

    info!(
        encryption_key = %authority.public_encryption_key(),
        verify_key = %authority.public_verify_key(),
        "authority loaded"
    );
    Ok(authority)
}
