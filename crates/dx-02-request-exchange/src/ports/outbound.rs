//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the request builders depend on.

use crate::domain::entities::{OutboundMessage, ProtocolKind, TemplateKind, TemplateRequest};
use crate::domain::errors::RequestError;
use async_trait::async_trait;
use dx_01_token_verification::ClaimsError;
use shared_types::MessageEnvelope;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// DAT source for outgoing headers, shared with the inbound side.
pub use dx_01_token_verification::{TokenSource, TokenSourceError};

// =============================================================================
// TEMPLATE PROVIDER
// =============================================================================

/// Error from building a message template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// No DAT could be fetched for the header's security token.
    #[error("Could not acquire token: {0}")]
    TokenAcquisition(String),

    /// The request lacks a field the template needs.
    #[error("Template field missing: {0}")]
    MissingField(&'static str),

    /// The provider has no template of this kind.
    #[error("No template for {0:?}")]
    Unsupported(TemplateKind),
}

impl From<TokenSourceError> for TemplateError {
    fn from(err: TokenSourceError) -> Self {
        TemplateError::TokenAcquisition(err.0)
    }
}

impl From<TemplateError> for RequestError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::TokenAcquisition(reason) => RequestError::TokenAcquisition(reason),
            other => RequestError::Template(other.to_string()),
        }
    }
}

/// Builds header messages from the connector's own identity and DAT.
pub trait TemplateProvider: Send + Sync {
    /// # Errors
    /// `TemplateError` when the header cannot be built.
    fn template_for(&self, request: &TemplateRequest) -> Result<OutboundMessage, TemplateError>;
}

// =============================================================================
// MESSAGE SERVICE
// =============================================================================

/// Faults raised while sending a message and reading the answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageServiceError {
    #[error("Failed to send message: {0}")]
    Send(String),

    #[error("Failed to serialize message: {0}")]
    Serialize(String),

    #[error("Failed to deserialize response: {0}")]
    Deserialize(String),

    #[error("Response failed SHACL validation: {0}")]
    ShaclValidation(String),

    #[error("Failed to parse multipart response: {0}")]
    MultipartParse(String),

    #[error("Unknown response: {0}")]
    UnknownResponse(String),

    /// The DAT of the response is missing, undecodable or invalid.
    #[error(transparent)]
    Claims(ClaimsError),
}

impl From<MessageServiceError> for RequestError {
    fn from(err: MessageServiceError) -> Self {
        match err {
            MessageServiceError::Send(reason) => RequestError::Transport(reason),
            MessageServiceError::Serialize(reason) => RequestError::Serialization(reason),
            MessageServiceError::Deserialize(reason) => RequestError::Deserialization(reason),
            MessageServiceError::ShaclValidation(reason) => RequestError::SchemaValidation(reason),
            MessageServiceError::MultipartParse(reason) => RequestError::MultipartParse(reason),
            MessageServiceError::UnknownResponse(reason) => RequestError::UnknownResponse(reason),
            MessageServiceError::Claims(err) => RequestError::Claims(err),
        }
    }
}

/// Sends one envelope to a target endpoint and returns the answer.
///
/// Wire encoding, connection handling, retries and timeouts are the
/// implementor's concern.
#[async_trait]
pub trait MessageService: Send + Sync {
    /// # Errors
    /// `MessageServiceError` for any fault during the exchange.
    async fn send(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, MessageServiceError>;
}

#[async_trait]
impl<S: MessageService + ?Sized> MessageService for Arc<S> {
    async fn send(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, MessageServiceError> {
        (**self).send(target, envelope).await
    }
}

// =============================================================================
// PROTOCOL HANDLER
// =============================================================================

/// Carries envelopes over one wire protocol.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    fn protocol(&self) -> ProtocolKind;

    /// # Errors
    /// The collaborator fault, mapped to its `RequestError` kind.
    async fn exchange(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, RequestError>;
}
