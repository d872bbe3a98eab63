//! # Message Dispatcher
//!
//! Application service implementing `MessageDispatchApi`.
//!
//! ## Flow
//!
//! 1. Decode the security token from the header
//! 2. Verify the claims with the injected `ClaimsVerificationApi`
//! 3. Look up the handler for the message kind
//! 4. Turn the handler outcome into an answer envelope
//!
//! Every failure becomes a `RejectionMessage` correlated with the request.
//! With a `TokenSource` attached, every answer carries this connector's DAT.

use crate::domain::entities::MessageResponse;
use crate::ports::inbound::MessageDispatchApi;
use crate::registry::HandlerRegistry;
use async_trait::async_trait;
use dx_01_token_verification::{ClaimsError, ClaimsVerificationApi, TokenDecoder, TokenSource};
use shared_types::{
    Claims, ConnectorIdentity, MessageEnvelope, MessageKind, MessageProcessedNotificationMessage,
    RejectionMessage, RejectionReason,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub struct MessageDispatcher {
    identity: ConnectorIdentity,
    verifier: Arc<dyn ClaimsVerificationApi>,
    decoder: Arc<dyn TokenDecoder>,
    registry: Arc<HandlerRegistry>,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl MessageDispatcher {
    pub fn new(
        identity: ConnectorIdentity,
        verifier: Arc<dyn ClaimsVerificationApi>,
        decoder: Arc<dyn TokenDecoder>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            identity,
            verifier,
            decoder,
            registry,
            token_source: None,
        }
    }

    /// Stamp answers with DATs from `source`.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn identity(&self) -> &ConnectorIdentity {
        &self.identity
    }

    /// Dispatch with claims the caller already decoded.
    ///
    /// `None` claims are rejected as not authenticated.
    pub async fn dispatch_with_claims(
        &self,
        envelope: MessageEnvelope,
        claims: Option<&Claims>,
    ) -> MessageEnvelope {
        let answer = self.answer(envelope, claims).await;
        self.stamp(answer)
    }

    async fn answer(&self, envelope: MessageEnvelope, claims: Option<&Claims>) -> MessageEnvelope {
        let kind = envelope.kind();
        let sender = envelope.header().issuer_connector.clone();

        let claims = match (claims, self.verifier.verify(claims)) {
            (Some(claims), Ok(_)) => claims,
            (_, Err(err)) => {
                warn!(sender = %sender, kind = %kind, error = %err, "Rejecting message, claims invalid");
                return self.reject(&envelope, RejectionReason::NotAuthenticated, err.to_string());
            }
            (None, Ok(_)) => {
                return self.reject(
                    &envelope,
                    RejectionReason::NotAuthenticated,
                    ClaimsError::NullInput.to_string(),
                )
            }
        };

        let Some(handler) = self.registry.get(kind) else {
            warn!(sender = %sender, kind = %kind, "No handler for message type");
            return self.reject(
                &envelope,
                RejectionReason::MessageTypeNotSupported,
                format!("No handler for {kind}"),
            );
        };

        debug!(sender = %sender, kind = %kind, "Routing message to handler");
        match handler.handle(&envelope, claims).await {
            Ok(MessageResponse::Body(answer)) => answer,
            Ok(MessageResponse::NoContent) => MessageEnvelope::MessageProcessed {
                message: MessageProcessedNotificationMessage {
                    header: self.identity.response_header(
                        MessageKind::MessageProcessedNotification,
                        envelope.header(),
                    ),
                },
            },
            Ok(MessageResponse::Error { reason, message }) => {
                debug!(sender = %sender, kind = %kind, reason = %reason, "Handler refused message");
                self.reject(&envelope, reason, message)
            }
            Err(err) => {
                error!(sender = %sender, kind = %kind, error = %err, "Handler failed");
                self.reject(&envelope, err.rejection_reason(), err.to_string())
            }
        }
    }

    /// Attach this connector's DAT unless the answer already carries one.
    fn stamp(&self, mut answer: MessageEnvelope) -> MessageEnvelope {
        let Some(source) = &self.token_source else {
            return answer;
        };
        if answer.header().security_token.is_some() {
            return answer;
        }
        match source.current_token() {
            Ok(token) => answer.header_mut().security_token = Some(token),
            Err(err) => warn!(kind = %answer.kind(), error = %err, "Answering without security token"),
        }
        answer
    }

    fn reject(
        &self,
        request: &MessageEnvelope,
        reason: RejectionReason,
        text: impl Into<String>,
    ) -> MessageEnvelope {
        MessageEnvelope::Rejection {
            message: RejectionMessage {
                header: self
                    .identity
                    .response_header(MessageKind::Rejection, request.header()),
                rejection_reason: reason,
            },
            payload: Some(text.into()),
        }
    }
}

#[async_trait]
impl MessageDispatchApi for MessageDispatcher {
    async fn dispatch(&self, envelope: MessageEnvelope) -> MessageEnvelope {
        let Some(token) = envelope.header().security_token.clone() else {
            warn!(
                sender = %envelope.header().issuer_connector,
                "Rejecting message without security token"
            );
            return self.stamp(self.reject(
                &envelope,
                RejectionReason::NotAuthenticated,
                "Message carries no security token",
            ));
        };

        match self.decoder.decode(&token) {
            Ok(claims) => self.dispatch_with_claims(envelope, Some(&claims)).await,
            Err(err) => {
                warn!(
                    sender = %envelope.header().issuer_connector,
                    error = %err,
                    "Rejecting message with undecodable token"
                );
                self.stamp(self.reject(
                    &envelope,
                    RejectionReason::NotAuthenticated,
                    err.to_string(),
                ))
            }
        }
    }
}
