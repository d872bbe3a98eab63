//! # `MessageEnvelope`
//!
//! The closed family of (header message, payload) pairs exchanged between
//! connectors. Constructed immediately before sending or immediately after
//! receiving; immutable thereafter.
//!
//! ## Payload Pairing
//!
//! - `payload()` is `None` **iff** `serialize_payload()` is `SerializedPayload::Empty`.
//! - No-payload variants (`MessageProcessed`, `ContractRejection`) always report
//!   the empty marker, whatever their header carries.

use crate::messages::{
    ConnectorCertificateGrantedMessage, ConnectorCertificateRevokedMessage,
    ConnectorUnavailableMessage, ConnectorUpdateMessage, ContractRejectionMessage,
    DescriptionResponseMessage, HeaderMessage, MessageHeader, MessageKind,
    MessageProcessedNotificationMessage, RejectionMessage, RejectionReason, ResultMessage,
};
use serde_json::Value;

/// Content type of serialized JSON payloads.
pub const JSON_CONTENT_TYPE: &str = "application/ld+json";

/// Content type of serialized text payloads.
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Content type of opaque binary payloads.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

// =============================================================================
// PAYLOADS
// =============================================================================

/// A payload as carried next to a header, before any typing by the receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Text(String),
    Json(Value),
    Binary(Vec<u8>),
}

impl RawPayload {
    /// Short name of the payload kind, used in mismatch diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            RawPayload::Text(_) => "text",
            RawPayload::Json(_) => "json",
            RawPayload::Binary(_) => "binary",
        }
    }

    fn serialize(&self) -> SerializedPayload {
        match self {
            RawPayload::Text(text) => SerializedPayload::Content {
                content_type: TEXT_CONTENT_TYPE,
                bytes: text.as_bytes().to_vec(),
            },
            RawPayload::Json(value) => SerializedPayload::Content {
                content_type: JSON_CONTENT_TYPE,
                bytes: value.to_string().into_bytes(),
            },
            RawPayload::Binary(bytes) => SerializedPayload::Content {
                content_type: BINARY_CONTENT_TYPE,
                bytes: bytes.clone(),
            },
        }
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        RawPayload::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        RawPayload::Text(text.to_string())
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        RawPayload::Json(value)
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        RawPayload::Binary(bytes)
    }
}

/// Canonical serialized form of a payload.
///
/// `Empty` is the marker for "no payload". A present payload never serializes
/// to it, even when its content is zero bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializedPayload {
    Empty,
    Content {
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl SerializedPayload {
    pub const EMPTY: SerializedPayload = SerializedPayload::Empty;

    pub fn is_empty(&self) -> bool {
        matches!(self, SerializedPayload::Empty)
    }

    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            SerializedPayload::Empty => None,
            SerializedPayload::Content { content_type, .. } => Some(*content_type),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SerializedPayload::Empty => &[],
            SerializedPayload::Content { bytes, .. } => bytes,
        }
    }
}

// =============================================================================
// REJECTIONS
// =============================================================================

/// Rejection content extracted from a rejection envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: Option<String>,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A header message paired with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEnvelope {
    CertificateGranted {
        message: ConnectorCertificateGrantedMessage,
        payload: Option<RawPayload>,
    },
    CertificateRevoked {
        message: ConnectorCertificateRevokedMessage,
        payload: Option<RawPayload>,
    },
    ConnectorUpdate {
        message: ConnectorUpdateMessage,
        payload: Option<RawPayload>,
    },
    ConnectorUnavailable {
        message: ConnectorUnavailableMessage,
        payload: Option<RawPayload>,
    },
    MessageProcessed {
        message: MessageProcessedNotificationMessage,
    },
    Description {
        message: DescriptionResponseMessage,
        payload: Value,
    },
    Result {
        message: ResultMessage,
        payload: String,
    },
    Rejection {
        message: RejectionMessage,
        payload: Option<String>,
    },
    ContractRejection {
        message: ContractRejectionMessage,
    },
}

/// Borrowed view of the typed header message inside an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderMessageRef<'a> {
    CertificateGranted(&'a ConnectorCertificateGrantedMessage),
    CertificateRevoked(&'a ConnectorCertificateRevokedMessage),
    ConnectorUpdate(&'a ConnectorUpdateMessage),
    ConnectorUnavailable(&'a ConnectorUnavailableMessage),
    MessageProcessed(&'a MessageProcessedNotificationMessage),
    Description(&'a DescriptionResponseMessage),
    Result(&'a ResultMessage),
    Rejection(&'a RejectionMessage),
    ContractRejection(&'a ContractRejectionMessage),
}

impl<'a> HeaderMessageRef<'a> {
    pub fn header(self) -> &'a MessageHeader {
        match self {
            HeaderMessageRef::CertificateGranted(message) => message.header(),
            HeaderMessageRef::CertificateRevoked(message) => message.header(),
            HeaderMessageRef::ConnectorUpdate(message) => message.header(),
            HeaderMessageRef::ConnectorUnavailable(message) => message.header(),
            HeaderMessageRef::MessageProcessed(message) => message.header(),
            HeaderMessageRef::Description(message) => message.header(),
            HeaderMessageRef::Result(message) => message.header(),
            HeaderMessageRef::Rejection(message) => message.header(),
            HeaderMessageRef::ContractRejection(message) => message.header(),
        }
    }

    pub fn kind(self) -> MessageKind {
        match self {
            HeaderMessageRef::CertificateGranted(_) => ConnectorCertificateGrantedMessage::KIND,
            HeaderMessageRef::CertificateRevoked(_) => ConnectorCertificateRevokedMessage::KIND,
            HeaderMessageRef::ConnectorUpdate(_) => ConnectorUpdateMessage::KIND,
            HeaderMessageRef::ConnectorUnavailable(_) => ConnectorUnavailableMessage::KIND,
            HeaderMessageRef::MessageProcessed(_) => MessageProcessedNotificationMessage::KIND,
            HeaderMessageRef::Description(_) => DescriptionResponseMessage::KIND,
            HeaderMessageRef::Result(_) => ResultMessage::KIND,
            HeaderMessageRef::Rejection(_) => RejectionMessage::KIND,
            HeaderMessageRef::ContractRejection(_) => ContractRejectionMessage::KIND,
        }
    }
}

impl MessageEnvelope {
    /// The typed header message of this variant.
    pub fn message(&self) -> HeaderMessageRef<'_> {
        match self {
            MessageEnvelope::CertificateGranted { message, .. } => {
                HeaderMessageRef::CertificateGranted(message)
            }
            MessageEnvelope::CertificateRevoked { message, .. } => {
                HeaderMessageRef::CertificateRevoked(message)
            }
            MessageEnvelope::ConnectorUpdate { message, .. } => {
                HeaderMessageRef::ConnectorUpdate(message)
            }
            MessageEnvelope::ConnectorUnavailable { message, .. } => {
                HeaderMessageRef::ConnectorUnavailable(message)
            }
            MessageEnvelope::MessageProcessed { message } => {
                HeaderMessageRef::MessageProcessed(message)
            }
            MessageEnvelope::Description { message, .. } => HeaderMessageRef::Description(message),
            MessageEnvelope::Result { message, .. } => HeaderMessageRef::Result(message),
            MessageEnvelope::Rejection { message, .. } => HeaderMessageRef::Rejection(message),
            MessageEnvelope::ContractRejection { message } => {
                HeaderMessageRef::ContractRejection(message)
            }
        }
    }

    /// Common header fields of the carried message.
    pub fn header(&self) -> &MessageHeader {
        self.message().header()
    }

    /// Mutable common header, used to stamp the security token.
    pub fn header_mut(&mut self) -> &mut MessageHeader {
        match self {
            MessageEnvelope::CertificateGranted { message, .. } => &mut message.header,
            MessageEnvelope::CertificateRevoked { message, .. } => &mut message.header,
            MessageEnvelope::ConnectorUpdate { message, .. } => &mut message.header,
            MessageEnvelope::ConnectorUnavailable { message, .. } => &mut message.header,
            MessageEnvelope::MessageProcessed { message } => &mut message.header,
            MessageEnvelope::Description { message, .. } => &mut message.header,
            MessageEnvelope::Result { message, .. } => &mut message.header,
            MessageEnvelope::Rejection { message, .. } => &mut message.header,
            MessageEnvelope::ContractRejection { message } => &mut message.header,
        }
    }

    /// Message type of the carried header.
    pub fn kind(&self) -> MessageKind {
        self.message().kind()
    }

    /// The payload, if this variant carries one.
    pub fn payload(&self) -> Option<RawPayload> {
        match self {
            MessageEnvelope::CertificateGranted { payload, .. }
            | MessageEnvelope::CertificateRevoked { payload, .. }
            | MessageEnvelope::ConnectorUpdate { payload, .. }
            | MessageEnvelope::ConnectorUnavailable { payload, .. } => payload.clone(),
            MessageEnvelope::Description { payload, .. } => Some(RawPayload::Json(payload.clone())),
            MessageEnvelope::Result { payload, .. } => Some(RawPayload::Text(payload.clone())),
            MessageEnvelope::Rejection { payload, .. } => payload.clone().map(RawPayload::Text),
            MessageEnvelope::MessageProcessed { .. } | MessageEnvelope::ContractRejection { .. } => {
                None
            }
        }
    }

    /// Canonical serialized payload; `Empty` exactly when `payload()` is `None`.
    pub fn serialize_payload(&self) -> SerializedPayload {
        match self.payload() {
            Some(payload) => payload.serialize(),
            None => SerializedPayload::EMPTY,
        }
    }

    /// Rejection content, for the rejection variants only.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            MessageEnvelope::Rejection { message, payload } => Some(Rejection {
                reason: message.rejection_reason,
                message: payload.clone(),
            }),
            MessageEnvelope::ContractRejection { message } => Some(Rejection {
                reason: message.rejection_reason,
                message: message
                    .contract_rejection_reason
                    .as_ref()
                    .map(|literal| literal.value.clone()),
            }),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MessageEnvelope::Rejection { .. } | MessageEnvelope::ContractRejection { .. }
        )
    }
}
