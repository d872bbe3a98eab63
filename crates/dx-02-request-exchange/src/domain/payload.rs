//! Payload types a request can expect in its answer.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared_types::RawPayload;

/// A type the raw response payload can be converted into.
///
/// `from_raw` hands the payload back unchanged when it does not fit, so the
/// caller can report what actually arrived.
pub trait ExpectedPayload: Sized + Send + 'static {
    fn type_name() -> &'static str;

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload>;
}

impl ExpectedPayload for String {
    fn type_name() -> &'static str {
        "text"
    }

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload> {
        match raw {
            RawPayload::Text(text) => Ok(text),
            other => Err(other),
        }
    }
}

impl ExpectedPayload for Value {
    fn type_name() -> &'static str {
        "json"
    }

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload> {
        match raw {
            RawPayload::Json(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl ExpectedPayload for Vec<u8> {
    fn type_name() -> &'static str {
        "binary"
    }

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload> {
        match raw {
            RawPayload::Binary(bytes) => Ok(bytes),
            other => Err(other),
        }
    }
}

/// Accepts any payload as is.
impl ExpectedPayload for RawPayload {
    fn type_name() -> &'static str {
        "any"
    }

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload> {
        Ok(raw)
    }
}

/// A JSON payload decoded into `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Send + 'static> ExpectedPayload for Json<T> {
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn from_raw(raw: RawPayload) -> Result<Self, RawPayload> {
        let decoded = match &raw {
            RawPayload::Json(value) => T::deserialize(value).ok(),
            RawPayload::Text(text) => serde_json::from_str(text).ok(),
            RawPayload::Binary(_) => None,
        };
        decoded.map(Json).ok_or(raw)
    }
}
