//! Action dispatch for the outer request envelope.
//!
//! Every request is JSON with an integer `action` field. The action is
//! parsed to a tagged variant before any handler runs; an unknown value
//! is an explicit parse error, never control flow by exception.

use serde_json::Value;

use crate::error::ProtoError;

/// The operations a client can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Publish,
    Unpublish,
    Lookup,
    Status,
    ReverseLookup,
    Search,
}

impl Action {
    /// Parse a wire action code.
    pub fn from_code(code: i64) -> Result<Self, ProtoError> {
        match code {
            1 => Ok(Self::Publish),
            2 => Ok(Self::Unpublish),
            3 => Ok(Self::Lookup),
            4 => Ok(Self::Status),
            5 => Ok(Self::ReverseLookup),
            6 => Ok(Self::Search),
            other => Err(ProtoError::UnrecognizedAction(other)),
        }
    }

    /// The wire code for this action.
    pub fn code(self) -> i64 {
        match self {
            Self::Publish => 1,
            Self::Unpublish => 2,
            Self::Lookup => 3,
            Self::Status => 4,
            Self::ReverseLookup => 5,
            Self::Search => 6,
        }
    }
}

/// Parse a raw request body into an action and the envelope object.
///
/// Fails with `BadPayload` for non-JSON bodies, non-object envelopes, and
/// missing or non-integer `action` fields; fails with `UnrecognizedAction`
/// for integers outside the dispatch table.
pub fn parse_request(body: &str) -> Result<(Action, Value), ProtoError> {
    let envelope: Value = serde_json::from_str(body).map_err(|_| ProtoError::BadPayload)?;
    if !envelope.is_object() {
        return Err(ProtoError::BadPayload);
    }
    let code = envelope
        .get("action")
        .and_then(Value::as_i64)
        .ok_or(ProtoError::BadPayload)?;
    let action = Action::from_code(code)?;
    Ok((action, envelope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_roundtrip() {
        for code in 1..=6 {
            let action = Action::from_code(code).unwrap();
            assert_eq!(action.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_is_tagged_error() {
        assert_eq!(Action::from_code(0), Err(ProtoError::UnrecognizedAction(0)));
        assert_eq!(Action::from_code(7), Err(ProtoError::UnrecognizedAction(7)));
        assert_eq!(
            Action::from_code(-1),
            Err(ProtoError::UnrecognizedAction(-1))
        );
    }

    #[test]
    fn test_parse_request() {
        let (action, envelope) = parse_request(r#"{"action": 3, "name": "echo"}"#).unwrap();
        assert_eq!(action, Action::Lookup);
        assert_eq!(envelope["name"], "echo");
    }

    #[test]
    fn test_parse_request_rejects_garbage() {
        assert_eq!(parse_request("not json"), Err(ProtoError::BadPayload));
        assert_eq!(parse_request("[1,2]"), Err(ProtoError::BadPayload));
        assert_eq!(parse_request(r#"{"action": "1"}"#), Err(ProtoError::BadPayload));
        assert_eq!(parse_request(r#"{"no_action": 1}"#), Err(ProtoError::BadPayload));
        assert_eq!(
            parse_request(r#"{"action": 9}"#),
            Err(ProtoError::UnrecognizedAction(9))
        );
    }
}
