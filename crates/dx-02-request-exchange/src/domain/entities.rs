//! # Request Entities
//!
//! Configuration accumulated by request builders, the templates they ask for
//! and the container handed back to callers.

use super::errors::RequestError;
use shared_types::{
    ConnectorCertificateGrantedMessage, ConnectorCertificateRevokedMessage,
    ConnectorUnavailableMessage, ConnectorUpdateMessage, HeaderMessage, MessageEnvelope,
    MessageHeader, MessageKind, RawPayload, Rejection, TypedLiteral,
};
use std::fmt;
use url::Url;

// =============================================================================
// CONFIGURATION VALUES
// =============================================================================

/// CRUD operation selecting which message template a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "CREATE",
            Operation::Read => "READ",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        })
    }
}

/// Wire protocol used to carry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolKind {
    Multipart,
    Idscp,
    Ldp,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolKind::Multipart => "MULTIPART",
            ProtocolKind::Idscp => "IDSCP",
            ProtocolKind::Ldp => "LDP",
        })
    }
}

/// What `execute` does with a rejection answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionPolicy {
    /// Return the rejection inside an ordinary `MessageContainer`.
    #[default]
    Propagate,
    /// Fail with `RequestError::Rejection`.
    ThrowOnRejection,
}

/// Configuration phase of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing set yet.
    Unconfigured,
    /// Some fields set, protocol or operation still missing.
    PartiallyConfigured,
    /// Protocol and operation set; ready to execute.
    Configured,
}

/// Snapshot of everything a builder has been told.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub operation: Option<Operation>,
    pub protocol: Option<ProtocolKind>,
    pub affected_connector: Option<Url>,
    pub revocation_reason: Option<TypedLiteral>,
    pub payload: Option<RawPayload>,
    pub rejection_policy: RejectionPolicy,
    /// Policy chosen on this builder rather than inherited from the service.
    pub policy_set: bool,
}

impl RequestConfig {
    /// Config that starts from a non-default rejection policy.
    pub fn with_policy(rejection_policy: RejectionPolicy) -> Self {
        Self {
            rejection_policy,
            ..Self::default()
        }
    }

    pub fn set_rejection_policy(&mut self, policy: RejectionPolicy) {
        self.rejection_policy = policy;
        self.policy_set = true;
    }

    pub fn state(&self) -> BuilderState {
        if self.protocol.is_some() && self.operation.is_some() {
            BuilderState::Configured
        } else if self.protocol.is_none()
            && self.operation.is_none()
            && self.affected_connector.is_none()
            && self.revocation_reason.is_none()
            && self.payload.is_none()
            && !self.policy_set
        {
            BuilderState::Unconfigured
        } else {
            BuilderState::PartiallyConfigured
        }
    }

    /// Names of the required fields that are still unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.protocol.is_none() {
            missing.push("protocol");
        }
        if self.operation.is_none() {
            missing.push("operation");
        }
        missing
    }

    /// Protocol and operation, or a precondition error naming what is unset.
    ///
    /// # Errors
    /// `RequestError::Precondition` listing every missing field.
    pub fn require_protocol_and_operation(
        &self,
    ) -> Result<(ProtocolKind, Operation), RequestError> {
        match (self.protocol, self.operation) {
            (Some(protocol), Some(operation)) => Ok((protocol, operation)),
            _ => Err(RequestError::Precondition {
                missing: self.missing_fields(),
            }),
        }
    }

    pub(crate) fn require_affected_connector(&self) -> Result<Url, RequestError> {
        self.affected_connector
            .clone()
            .ok_or(RequestError::Precondition {
                missing: vec!["affected_connector"],
            })
    }

    /// Affected connector and revocation reason, both required for a
    /// revocation.
    pub(crate) fn require_revocation(&self) -> Result<(Url, TypedLiteral), RequestError> {
        match (&self.affected_connector, &self.revocation_reason) {
            (Some(affected), Some(reason)) => Ok((affected.clone(), reason.clone())),
            (affected, reason) => {
                let mut missing = Vec::new();
                if affected.is_none() {
                    missing.push("affected_connector");
                }
                if reason.is_none() {
                    missing.push("revocation_reason");
                }
                Err(RequestError::Precondition { missing })
            }
        }
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Header message template a request asks the provider for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    CertificateGranted,
    CertificateRevoked,
    ConnectorUpdate,
    ConnectorUnavailable,
}

impl TemplateKind {
    pub const fn message_kind(self) -> MessageKind {
        match self {
            TemplateKind::CertificateGranted => MessageKind::ConnectorCertificateGranted,
            TemplateKind::CertificateRevoked => MessageKind::ConnectorCertificateRevoked,
            TemplateKind::ConnectorUpdate => MessageKind::ConnectorUpdate,
            TemplateKind::ConnectorUnavailable => MessageKind::ConnectorUnavailable,
        }
    }
}

/// Input to the template provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    pub kind: TemplateKind,
    /// Endpoint the message will be sent to.
    pub recipient: Url,
    /// Connector the message is about.
    pub affected_connector: Url,
    pub revocation_reason: Option<TypedLiteral>,
}

/// A header message ready to be paired with a payload and sent.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    CertificateGranted(ConnectorCertificateGrantedMessage),
    CertificateRevoked(ConnectorCertificateRevokedMessage),
    ConnectorUpdate(ConnectorUpdateMessage),
    ConnectorUnavailable(ConnectorUnavailableMessage),
}

impl OutboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            OutboundMessage::CertificateGranted(_) => ConnectorCertificateGrantedMessage::KIND,
            OutboundMessage::CertificateRevoked(_) => ConnectorCertificateRevokedMessage::KIND,
            OutboundMessage::ConnectorUpdate(_) => ConnectorUpdateMessage::KIND,
            OutboundMessage::ConnectorUnavailable(_) => ConnectorUnavailableMessage::KIND,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            OutboundMessage::CertificateGranted(message) => message.header(),
            OutboundMessage::CertificateRevoked(message) => message.header(),
            OutboundMessage::ConnectorUpdate(message) => message.header(),
            OutboundMessage::ConnectorUnavailable(message) => message.header(),
        }
    }

    /// Pair the message with the request payload.
    pub fn into_envelope(self, payload: Option<RawPayload>) -> MessageEnvelope {
        match self {
            OutboundMessage::CertificateGranted(message) => {
                MessageEnvelope::CertificateGranted { message, payload }
            }
            OutboundMessage::CertificateRevoked(message) => {
                MessageEnvelope::CertificateRevoked { message, payload }
            }
            OutboundMessage::ConnectorUpdate(message) => {
                MessageEnvelope::ConnectorUpdate { message, payload }
            }
            OutboundMessage::ConnectorUnavailable(message) => {
                MessageEnvelope::ConnectorUnavailable { message, payload }
            }
        }
    }
}

// =============================================================================
// RESPONSE CONTAINER
// =============================================================================

/// Metadata of the answer a request received.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    pub header: MessageHeader,
    pub kind: MessageKind,
    /// Set when the remote side rejected the request and the policy was
    /// `Propagate`.
    pub rejection: Option<Rejection>,
}

/// Result of a successful exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContainer<T> {
    payload: Option<T>,
    meta: ResponseMeta,
}

impl<T> MessageContainer<T> {
    pub fn new(payload: Option<T>, meta: ResponseMeta) -> Self {
        Self { payload, meta }
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    pub fn header(&self) -> &MessageHeader {
        &self.meta.header
    }

    pub fn kind(&self) -> MessageKind {
        self.meta.kind
    }

    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.meta.rejection.as_ref()
    }

    pub fn is_rejection(&self) -> bool {
        self.meta.rejection.is_some()
    }
}
