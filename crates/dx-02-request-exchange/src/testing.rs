//! Centralized Testing Utilities
//!
//! Recording template provider and scripted message service used by the unit
//! tests here and by the workspace integration tests. Available with the
//! `test-utils` feature flag.

use crate::adapters::IdentityTemplateProvider;
use crate::domain::entities::{OutboundMessage, TemplateRequest};
use crate::ports::outbound::{
    MessageService, MessageServiceError, TemplateError, TemplateProvider, TokenSource,
    TokenSourceError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    ConnectorIdentity, MessageEnvelope, MessageKind, MessageProcessedNotificationMessage,
    RejectionMessage, RejectionReason, SecurityToken,
};
use std::sync::Arc;
use url::Url;

/// Token source that always returns the same JWT.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: SecurityToken,
}

impl StaticTokenSource {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            token: SecurityToken::jwt(value),
        }
    }
}

impl TokenSource for StaticTokenSource {
    fn current_token(&self) -> Result<SecurityToken, TokenSourceError> {
        Ok(self.token.clone())
    }
}

// =============================================================================
// RECORDING TEMPLATE PROVIDER
// =============================================================================

/// Template provider that records every request and the message it built.
pub struct RecordingTemplateProvider {
    inner: IdentityTemplateProvider<StaticTokenSource>,
    pub requests: Arc<Mutex<Vec<TemplateRequest>>>,
    pub issued: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingTemplateProvider {
    pub fn new(identity: ConnectorIdentity) -> Self {
        Self {
            inner: IdentityTemplateProvider::new(identity, StaticTokenSource::new("test-dat")),
            requests: Arc::new(Mutex::new(Vec::new())),
            issued: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TemplateProvider for RecordingTemplateProvider {
    fn template_for(&self, request: &TemplateRequest) -> Result<OutboundMessage, TemplateError> {
        self.requests.lock().push(request.clone());
        let message = self.inner.template_for(request)?;
        self.issued.lock().push(message.clone());
        Ok(message)
    }
}

// =============================================================================
// SCRIPTED MESSAGE SERVICE
// =============================================================================

/// How the scripted service answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `MessageProcessedNotification` correlated with the request.
    Processed,
    /// `RejectionMessage` with the given reason and text.
    Reject(RejectionReason, Option<String>),
    /// A fixed envelope.
    Envelope(MessageEnvelope),
    /// A transport-level failure.
    Fail(MessageServiceError),
}

/// Message service that records what was sent and answers from a script.
pub struct ScriptedMessageService {
    responder: ConnectorIdentity,
    reply: Mutex<Reply>,
    pub sent: Arc<Mutex<Vec<(Url, MessageEnvelope)>>>,
}

impl ScriptedMessageService {
    pub fn new(reply: Reply) -> Self {
        let responder =
            ConnectorIdentity::new(Url::parse("https://responder.test/").expect("static url"));
        Self {
            responder,
            reply: Mutex::new(reply),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock() = reply;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MessageService for ScriptedMessageService {
    async fn send(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, MessageServiceError> {
        let request_header = envelope.header().clone();
        self.sent.lock().push((target.clone(), envelope));

        let reply = self.reply.lock().clone();
        match reply {
            Reply::Processed => Ok(MessageEnvelope::MessageProcessed {
                message: MessageProcessedNotificationMessage {
                    header: self
                        .responder
                        .response_header(MessageKind::MessageProcessedNotification, &request_header),
                },
            }),
            Reply::Reject(reason, text) => Ok(MessageEnvelope::Rejection {
                message: RejectionMessage {
                    header: self
                        .responder
                        .response_header(MessageKind::Rejection, &request_header),
                    rejection_reason: reason,
                },
                payload: text,
            }),
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Fail(err) => Err(err),
        }
    }
}
