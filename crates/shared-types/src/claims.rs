//! # DAT Claims
//!
//! The decoded body of a Dynamic Attribute Token presented by a remote
//! connector. Decoding and signature checks happen upstream; this type only
//! carries what the token asserted.
//!
//! ## Time Claims
//!
//! `iat`, `nbf` and `exp` are optional on purpose: a token that omits one of
//! them is representable, and the verifier reports the missing claim as a
//! structured error instead of failing on access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Claims of a decoded DAT.
///
/// Field names on the wire follow RFC 7519; every claim that is not one of the
/// registered time/subject claims lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued At (`iat`).
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,

    /// Not Before (`nbf`).
    #[serde(rename = "nbf", default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Timestamp>,

    /// Expiration Time (`exp`).
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Timestamp>,

    /// Subject (`sub`), the connector the token was issued to.
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// All remaining claims (`securityProfile`, `referringConnector`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Claims with a complete validity window and no subject.
    pub fn window(issued_at: Timestamp, not_before: Timestamp, expiration: Timestamp) -> Self {
        Self {
            issued_at: Some(issued_at),
            not_before: Some(not_before),
            expiration: Some(expiration),
            ..Self::default()
        }
    }

    /// Set the subject claim.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Add a custom claim.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Look up a custom claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Look up a custom claim holding a string.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}
