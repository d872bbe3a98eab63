//! # Multipart Wire Codec
//!
//! Two-part frame: a JSON-LD header part whose `@type` names the message
//! kind, and the canonical serialized payload part.

use dx_02_request_exchange::MessageServiceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::envelope::{BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE, TEXT_CONTENT_TYPE};
use shared_types::{MessageEnvelope, MessageKind, RawPayload, SerializedPayload};

const TYPE_KEY: &str = "@type";

/// Header and payload parts of one message on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFrame {
    pub header: Vec<u8>,
    pub payload: SerializedPayload,
}

impl MultipartFrame {
    /// Total bytes across both parts.
    pub fn len(&self) -> usize {
        self.header.len() + self.payload.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encode an envelope into its two parts.
///
/// # Errors
/// `MessageServiceError::Serialize` when the header cannot be written.
pub fn encode(envelope: &MessageEnvelope) -> Result<MultipartFrame, MessageServiceError> {
    let kind = envelope.kind();
    let header = match envelope {
        MessageEnvelope::CertificateGranted { message, .. } => header_part(kind, message),
        MessageEnvelope::CertificateRevoked { message, .. } => header_part(kind, message),
        MessageEnvelope::ConnectorUpdate { message, .. } => header_part(kind, message),
        MessageEnvelope::ConnectorUnavailable { message, .. } => header_part(kind, message),
        MessageEnvelope::MessageProcessed { message } => header_part(kind, message),
        MessageEnvelope::Description { message, .. } => header_part(kind, message),
        MessageEnvelope::Result { message, .. } => header_part(kind, message),
        MessageEnvelope::Rejection { message, .. } => header_part(kind, message),
        MessageEnvelope::ContractRejection { message } => header_part(kind, message),
    }?;

    Ok(MultipartFrame {
        header,
        payload: envelope.serialize_payload(),
    })
}

fn header_part<M: Serialize>(kind: MessageKind, message: &M) -> Result<Vec<u8>, MessageServiceError> {
    let mut value =
        serde_json::to_value(message).map_err(|e| MessageServiceError::Serialize(e.to_string()))?;
    match value.as_object_mut() {
        Some(object) => {
            object.insert(TYPE_KEY.to_string(), Value::String(kind.as_str().to_string()));
        }
        None => {
            return Err(MessageServiceError::Serialize(format!(
                "{kind} header is not a JSON object"
            )))
        }
    }
    serde_json::to_vec(&value).map_err(|e| MessageServiceError::Serialize(e.to_string()))
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a frame back into an envelope.
///
/// # Errors
/// - `MultipartParse` when the header part is not a typed JSON object or the
///   payload part does not fit the message kind
/// - `UnknownResponse` when `@type` names no known message
/// - `Deserialize` when the header fields or payload bytes are invalid
pub fn decode(frame: &MultipartFrame) -> Result<MessageEnvelope, MessageServiceError> {
    let mut value: Value = serde_json::from_slice(&frame.header)
        .map_err(|e| MessageServiceError::MultipartParse(format!("header part: {e}")))?;

    let type_name = value
        .as_object_mut()
        .and_then(|object| object.remove(TYPE_KEY))
        .ok_or_else(|| MessageServiceError::MultipartParse("header part has no @type".into()))?;
    let type_name = type_name
        .as_str()
        .ok_or_else(|| MessageServiceError::MultipartParse("@type is not a string".into()))?;
    let kind = MessageKind::from_vocabulary(type_name)
        .ok_or_else(|| MessageServiceError::UnknownResponse(type_name.to_string()))?;

    let payload = decode_payload(&frame.payload)?;

    let envelope = match kind {
        MessageKind::ConnectorCertificateGranted => MessageEnvelope::CertificateGranted {
            message: header_fields(value)?,
            payload,
        },
        MessageKind::ConnectorCertificateRevoked => MessageEnvelope::CertificateRevoked {
            message: header_fields(value)?,
            payload,
        },
        MessageKind::ConnectorUpdate => MessageEnvelope::ConnectorUpdate {
            message: header_fields(value)?,
            payload,
        },
        MessageKind::ConnectorUnavailable => MessageEnvelope::ConnectorUnavailable {
            message: header_fields(value)?,
            payload,
        },
        MessageKind::MessageProcessedNotification => {
            no_payload(kind, payload)?;
            MessageEnvelope::MessageProcessed {
                message: header_fields(value)?,
            }
        }
        MessageKind::DescriptionResponse => match payload {
            Some(RawPayload::Json(payload)) => MessageEnvelope::Description {
                message: header_fields(value)?,
                payload,
            },
            other => return Err(payload_mismatch(kind, other.as_ref())),
        },
        MessageKind::Result => match payload {
            Some(RawPayload::Text(payload)) => MessageEnvelope::Result {
                message: header_fields(value)?,
                payload,
            },
            other => return Err(payload_mismatch(kind, other.as_ref())),
        },
        MessageKind::Rejection => match payload {
            None => MessageEnvelope::Rejection {
                message: header_fields(value)?,
                payload: None,
            },
            Some(RawPayload::Text(text)) => MessageEnvelope::Rejection {
                message: header_fields(value)?,
                payload: Some(text),
            },
            other => return Err(payload_mismatch(kind, other.as_ref())),
        },
        MessageKind::ContractRejection => {
            no_payload(kind, payload)?;
            MessageEnvelope::ContractRejection {
                message: header_fields(value)?,
            }
        }
    };
    Ok(envelope)
}

fn header_fields<M: DeserializeOwned>(value: Value) -> Result<M, MessageServiceError> {
    serde_json::from_value(value).map_err(|e| MessageServiceError::Deserialize(e.to_string()))
}

fn decode_payload(part: &SerializedPayload) -> Result<Option<RawPayload>, MessageServiceError> {
    let SerializedPayload::Content {
        content_type,
        bytes,
    } = part
    else {
        return Ok(None);
    };

    let payload = match *content_type {
        JSON_CONTENT_TYPE => RawPayload::Json(
            serde_json::from_slice(bytes)
                .map_err(|e| MessageServiceError::Deserialize(format!("payload part: {e}")))?,
        ),
        TEXT_CONTENT_TYPE => RawPayload::Text(
            String::from_utf8(bytes.clone())
                .map_err(|e| MessageServiceError::Deserialize(format!("payload part: {e}")))?,
        ),
        BINARY_CONTENT_TYPE => RawPayload::Binary(bytes.clone()),
        other => {
            return Err(MessageServiceError::MultipartParse(format!(
                "unsupported payload content type {other}"
            )))
        }
    };
    Ok(Some(payload))
}

fn no_payload(kind: MessageKind, payload: Option<RawPayload>) -> Result<(), MessageServiceError> {
    match payload {
        None => Ok(()),
        Some(payload) => Err(payload_mismatch(kind, Some(&payload))),
    }
}

fn payload_mismatch(kind: MessageKind, payload: Option<&RawPayload>) -> MessageServiceError {
    MessageServiceError::MultipartParse(format!(
        "{kind} cannot carry a {} payload part",
        payload.map_or("missing", RawPayload::type_name)
    ))
}
