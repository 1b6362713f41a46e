//! The response envelope and its stable status codes.
//!
//! Every response is JSON with a mandatory `c` field (0 = success) plus
//! action-specific fields, and optionally `signed_memorabilia` when the
//! request carried valid memorabilia.

use serde_json::{Map, Value};

/// Stable numeric status codes carried as `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum StatusCode {
    Ok = 0,
    MethodUnsupported = -1,
    NotSecure = -2,
    BadPayload = -3,
    RateLimited = -4,
    NameTaken = -25,
    DuplicateIdentity = -26,
    InvalidCharacter = -27,
    InvalidName = -28,
    NoSuchUser = -30,
    BadPassword = -31,
    LookupFailed = -41,
}

impl StatusCode {
    /// The wire value.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Human-readable description, for pretty error pages.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MethodUnsupported => "Method unsupported",
            Self::NotSecure => "Refusing to process request over an insecure transport",
            Self::BadPayload => "Bad payload",
            Self::RateLimited => "Rate limit exceeded, try again later",
            Self::NameTaken => "Name is taken",
            Self::DuplicateIdentity => "This identity key is already registered",
            Self::InvalidCharacter => "Name contains a disallowed character",
            Self::InvalidName => "Name is not allowed",
            Self::NoSuchUser => "No such user",
            Self::BadPassword => "Bad password",
            Self::LookupFailed => "Lookup failed",
        }
    }
}

/// A response under construction.
#[derive(Debug, Clone)]
pub struct Response {
    code: StatusCode,
    fields: Map<String, Value>,
    signed_memorabilia: Option<String>,
}

impl Response {
    /// A success response.
    pub fn ok() -> Self {
        Self::with_code(StatusCode::Ok)
    }

    /// An error response.
    pub fn error(code: StatusCode) -> Self {
        debug_assert_ne!(code, StatusCode::Ok);
        Self::with_code(code)
    }

    fn with_code(code: StatusCode) -> Self {
        Self {
            code,
            fields: Map::new(),
            signed_memorabilia: None,
        }
    }

    /// Attach an action-specific field.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Attach the memorabilia binding signature, if one was produced.
    ///
    /// Applied to every response for the request, success or failure.
    pub fn bind(mut self, signed_memorabilia: Option<String>) -> Self {
        self.signed_memorabilia = signed_memorabilia;
        self
    }

    /// The status code.
    pub fn status(&self) -> StatusCode {
        self.code
    }

    /// The HTTP status the collaborating transport should use.
    pub fn http_status(&self) -> u16 {
        if self.code == StatusCode::Ok {
            200
        } else {
            400
        }
    }

    /// Render the wire JSON.
    pub fn into_value(self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 2);
        map.insert("c".to_string(), Value::from(self.code.code()));
        for (k, v) in self.fields {
            map.insert(k, v);
        }
        if let Some(sig) = self.signed_memorabilia {
            map.insert("signed_memorabilia".to_string(), Value::String(sig));
        }
        Value::Object(map)
    }
}
