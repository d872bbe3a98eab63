//! # Dataspace Message Headers
//!
//! Header messages exchanged between connectors. Every concrete message embeds
//! the common `MessageHeader` and adds its kind-specific fields.
//!
//! ## Identity
//!
//! `issuer_connector` is the authoritative sender identity of a message; the
//! DAT attached as `security_token` must have been issued to that connector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Information model version stamped on outgoing headers.
pub const DEFAULT_MODEL_VERSION: &str = "4.1.0";

/// Token format identifier for JWT-encoded DATs.
pub const JWT_TOKEN_FORMAT: &str = "idsc:JWT";

// =============================================================================
// MESSAGE KINDS
// =============================================================================

/// Every header message type known to this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    ConnectorCertificateGranted,
    ConnectorCertificateRevoked,
    ConnectorUpdate,
    ConnectorUnavailable,
    MessageProcessedNotification,
    DescriptionResponse,
    Result,
    Rejection,
    ContractRejection,
}

impl MessageKind {
    pub const ALL: [MessageKind; 9] = [
        MessageKind::ConnectorCertificateGranted,
        MessageKind::ConnectorCertificateRevoked,
        MessageKind::ConnectorUpdate,
        MessageKind::ConnectorUnavailable,
        MessageKind::MessageProcessedNotification,
        MessageKind::DescriptionResponse,
        MessageKind::Result,
        MessageKind::Rejection,
        MessageKind::ContractRejection,
    ];

    /// Look up a kind by its vocabulary name (`ids:...Message`).
    pub fn from_vocabulary(name: &str) -> Option<MessageKind> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Vocabulary name of the message type.
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageKind::ConnectorCertificateGranted => "ids:ConnectorCertificateGrantedMessage",
            MessageKind::ConnectorCertificateRevoked => "ids:ConnectorCertificateRevokedMessage",
            MessageKind::ConnectorUpdate => "ids:ConnectorUpdateMessage",
            MessageKind::ConnectorUnavailable => "ids:ConnectorUnavailableMessage",
            MessageKind::MessageProcessedNotification => {
                "ids:MessageProcessedNotificationMessage"
            }
            MessageKind::DescriptionResponse => "ids:DescriptionResponseMessage",
            MessageKind::Result => "ids:ResultMessage",
            MessageKind::Rejection => "ids:RejectionMessage",
            MessageKind::ContractRejection => "ids:ContractRejectionMessage",
        }
    }

    /// Whether this kind is only ever sent as an answer to a request.
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            MessageKind::MessageProcessedNotification
                | MessageKind::DescriptionResponse
                | MessageKind::Result
                | MessageKind::Rejection
                | MessageKind::ContractRejection
        )
    }

    /// Path segment used in auto-generated message ids.
    fn id_segment(self) -> &'static str {
        match self {
            MessageKind::ConnectorCertificateGranted => "connectorCertificateGrantedMessage",
            MessageKind::ConnectorCertificateRevoked => "connectorCertificateRevokedMessage",
            MessageKind::ConnectorUpdate => "connectorUpdateMessage",
            MessageKind::ConnectorUnavailable => "connectorUnavailableMessage",
            MessageKind::MessageProcessedNotification => "messageProcessedNotificationMessage",
            MessageKind::DescriptionResponse => "descriptionResponseMessage",
            MessageKind::Result => "resultMessage",
            MessageKind::Rejection => "rejectionMessage",
            MessageKind::ContractRejection => "contractRejectionMessage",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// VALUE TYPES
// =============================================================================

/// A string literal with an optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedLiteral {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TypedLiteral {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl fmt::Display for TypedLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.language {
            Some(lang) => write!(f, "\"{}\"@{}", self.value, lang),
            None => f.write_str(&self.value),
        }
    }
}

/// Why a recipient refused to process a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    #[serde(rename = "idsc:BAD_PARAMETERS")]
    BadParameters,
    #[serde(rename = "idsc:INTERNAL_RECIPIENT_ERROR")]
    InternalRecipientError,
    #[serde(rename = "idsc:MALFORMED_MESSAGE")]
    MalformedMessage,
    #[serde(rename = "idsc:MESSAGE_TYPE_NOT_SUPPORTED")]
    MessageTypeNotSupported,
    #[serde(rename = "idsc:METHOD_NOT_SUPPORTED")]
    MethodNotSupported,
    #[serde(rename = "idsc:NOT_AUTHENTICATED")]
    NotAuthenticated,
    #[serde(rename = "idsc:NOT_AUTHORIZED")]
    NotAuthorized,
    #[serde(rename = "idsc:NOT_FOUND")]
    NotFound,
    #[serde(rename = "idsc:TEMPORARILY_NOT_AVAILABLE")]
    TemporarilyNotAvailable,
    #[serde(rename = "idsc:TOO_MANY_RESULTS")]
    TooManyResults,
    #[serde(rename = "idsc:VERSION_NOT_SUPPORTED")]
    VersionNotSupported,
}

impl RejectionReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            RejectionReason::BadParameters => "idsc:BAD_PARAMETERS",
            RejectionReason::InternalRecipientError => "idsc:INTERNAL_RECIPIENT_ERROR",
            RejectionReason::MalformedMessage => "idsc:MALFORMED_MESSAGE",
            RejectionReason::MessageTypeNotSupported => "idsc:MESSAGE_TYPE_NOT_SUPPORTED",
            RejectionReason::MethodNotSupported => "idsc:METHOD_NOT_SUPPORTED",
            RejectionReason::NotAuthenticated => "idsc:NOT_AUTHENTICATED",
            RejectionReason::NotAuthorized => "idsc:NOT_AUTHORIZED",
            RejectionReason::NotFound => "idsc:NOT_FOUND",
            RejectionReason::TemporarilyNotAvailable => "idsc:TEMPORARILY_NOT_AVAILABLE",
            RejectionReason::TooManyResults => "idsc:TOO_MANY_RESULTS",
            RejectionReason::VersionNotSupported => "idsc:VERSION_NOT_SUPPORTED",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The DAT attached to a message header, still in its encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityToken {
    pub token_format: String,
    pub token_value: String,
}

impl SecurityToken {
    pub fn jwt(token_value: impl Into<String>) -> Self {
        Self {
            token_format: JWT_TOKEN_FORMAT.to_string(),
            token_value: token_value.into(),
        }
    }
}

// =============================================================================
// COMMON HEADER
// =============================================================================

/// Fields shared by every header message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// Unique message id.
    pub id: Url,
    /// Information model version the sender speaks.
    pub model_version: String,
    /// Creation time.
    pub issued: DateTime<Utc>,
    /// Sending connector. Sole source of truth for sender identity.
    pub issuer_connector: Url,
    /// Agent acting on behalf of the issuer.
    pub sender_agent: Url,
    /// Intended recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_connector: Vec<Url>,
    /// Encoded DAT of the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<SecurityToken>,
    /// Id of the message this one answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_message: Option<Url>,
}

/// Identity a connector stamps on the headers it issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorIdentity {
    pub connector_id: Url,
    pub sender_agent: Url,
    pub model_version: String,
}

impl ConnectorIdentity {
    /// Identity whose sender agent is the connector itself.
    pub fn new(connector_id: Url) -> Self {
        Self {
            sender_agent: connector_id.clone(),
            connector_id,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_sender_agent(mut self, sender_agent: Url) -> Self {
        self.sender_agent = sender_agent;
        self
    }

    /// Fresh header for a message of `kind` addressed to `recipient`.
    pub fn header(&self, kind: MessageKind, recipient: Option<&Url>) -> MessageHeader {
        MessageHeader {
            id: self.autogen_id(kind),
            model_version: self.model_version.clone(),
            issued: Utc::now(),
            issuer_connector: self.connector_id.clone(),
            sender_agent: self.sender_agent.clone(),
            recipient_connector: recipient.cloned().into_iter().collect(),
            security_token: None,
            correlation_message: None,
        }
    }

    /// Header for an answer to `request`, correlated with it.
    pub fn response_header(&self, kind: MessageKind, request: &MessageHeader) -> MessageHeader {
        let mut header = self.header(kind, Some(&request.issuer_connector));
        header.correlation_message = Some(request.id.clone());
        header
    }

    fn autogen_id(&self, kind: MessageKind) -> Url {
        let mut id = self.connector_id.clone();
        id.set_path(&format!("/autogen/{}/{}", kind.id_segment(), Uuid::new_v4()));
        id.set_query(None);
        id.set_fragment(None);
        id
    }
}

// =============================================================================
// HEADER MESSAGES
// =============================================================================

/// Capability shared by all header messages.
pub trait HeaderMessage {
    /// Message type of the implementor.
    const KIND: MessageKind;

    /// Common header fields.
    fn header(&self) -> &MessageHeader;
}

macro_rules! header_message {
    ($ty:ident, $kind:expr) => {
        impl HeaderMessage for $ty {
            const KIND: MessageKind = $kind;

            fn header(&self) -> &MessageHeader {
                &self.header
            }
        }
    };
}

/// A connector's certificate was granted by the certification body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorCertificateGrantedMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub affected_connector: Url,
}

/// A connector's certificate was revoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorCertificateRevokedMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub affected_connector: Url,
    pub revocation_reason: TypedLiteral,
}

/// A connector publishes (or refreshes) its self-description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorUpdateMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub affected_connector: Url,
}

/// A connector announces that it is going offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorUnavailableMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub affected_connector: Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageProcessedNotificationMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionResponseMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
}

/// Structured negative answer to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub rejection_reason: RejectionReason,
}

/// Negative answer to a contract negotiation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRejectionMessage {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub rejection_reason: RejectionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_rejection_reason: Option<TypedLiteral>,
}

header_message!(ConnectorCertificateGrantedMessage, MessageKind::ConnectorCertificateGranted);
header_message!(ConnectorCertificateRevokedMessage, MessageKind::ConnectorCertificateRevoked);
header_message!(ConnectorUpdateMessage, MessageKind::ConnectorUpdate);
header_message!(ConnectorUnavailableMessage, MessageKind::ConnectorUnavailable);
header_message!(
    MessageProcessedNotificationMessage,
    MessageKind::MessageProcessedNotification
);
header_message!(DescriptionResponseMessage, MessageKind::DescriptionResponse);
header_message!(ResultMessage, MessageKind::Result);
header_message!(RejectionMessage, MessageKind::Rejection);
header_message!(ContractRejectionMessage, MessageKind::ContractRejection);
