//! Field validation rules shared by every write path.

use crate::error::ValidationError;

/// Hard limit on registered name length, in bytes.
pub const NAME_LIMIT_HARD: usize = 63;

/// Hard limit on bio length, in bytes.
pub const BIO_LIMIT: usize = 1372;

/// Characters that may never appear in a name.
pub const DISALLOWED_CHARS: &[char] = &[' ', '@', '/', ':', ';', '(', ')', '"', '\''];

/// Names reserved for the service's own surfaces.
pub const DISALLOWED_NAMES: &[&str] = &["api", "pk", "u", "friends", "admin"];

/// Accepted clock skew between client and server, in seconds. The
/// boundary is inclusive: a timestamp exactly this old is still fresh.
pub const FRESHNESS_WINDOW_SECS: i64 = 300;

/// Check a lowercase name against the character set, the reserved list,
/// and the length limit.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > NAME_LIMIT_HARD {
        return Err(ValidationError::Oversized);
    }
    if name.chars().any(|c| DISALLOWED_CHARS.contains(&c)) {
        return Err(ValidationError::InvalidCharacter);
    }
    if DISALLOWED_NAMES.contains(&name) {
        return Err(ValidationError::InvalidName);
    }
    Ok(())
}

/// Collapse runs of CR/LF into single spaces and trim the ends.
pub fn normalize_bio(bio: &str) -> String {
    let trimmed = bio.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut in_newline_run = false;
    for c in trimmed.chars() {
        if c == '\r' || c == '\n' {
            if !in_newline_run {
                out.push(' ');
                in_newline_run = true;
            }
        } else {
            out.push(c);
            in_newline_run = false;
        }
    }
    out
}

/// True iff `timestamp` is within the freshness window of `now`.
pub fn is_fresh(timestamp: i64, now: i64) -> bool {
    (now - timestamp).abs() <= FRESHNESS_WINDOW_SECS
}
