//! # Identity Template Provider
//!
//! Builds outbound header messages from the connector's own identity and the
//! DAT returned by a `TokenSource`.

use crate::domain::entities::{OutboundMessage, TemplateKind, TemplateRequest};
use crate::ports::outbound::{TemplateError, TemplateProvider, TokenSource};
use shared_types::{
    ConnectorCertificateGrantedMessage, ConnectorCertificateRevokedMessage,
    ConnectorIdentity, ConnectorUnavailableMessage, ConnectorUpdateMessage,
};
use tracing::trace;

pub struct IdentityTemplateProvider<S: TokenSource> {
    identity: ConnectorIdentity,
    tokens: S,
}

impl<S: TokenSource> IdentityTemplateProvider<S> {
    pub fn new(identity: ConnectorIdentity, tokens: S) -> Self {
        Self { identity, tokens }
    }

    pub fn identity(&self) -> &ConnectorIdentity {
        &self.identity
    }
}

impl<S: TokenSource> TemplateProvider for IdentityTemplateProvider<S> {
    fn template_for(&self, request: &TemplateRequest) -> Result<OutboundMessage, TemplateError> {
        let mut header = self
            .identity
            .header(request.kind.message_kind(), Some(&request.recipient));
        header.security_token = Some(self.tokens.current_token()?);
        let affected_connector = request.affected_connector.clone();

        trace!(kind = ?request.kind, id = %header.id, "Built message template");

        Ok(match request.kind {
            TemplateKind::CertificateGranted => {
                OutboundMessage::CertificateGranted(ConnectorCertificateGrantedMessage {
                    header,
                    affected_connector,
                })
            }
            TemplateKind::CertificateRevoked => {
                let revocation_reason = request
                    .revocation_reason
                    .clone()
                    .ok_or(TemplateError::MissingField("revocation_reason"))?;
                OutboundMessage::CertificateRevoked(ConnectorCertificateRevokedMessage {
                    header,
                    affected_connector,
                    revocation_reason,
                })
            }
            TemplateKind::ConnectorUpdate => {
                OutboundMessage::ConnectorUpdate(ConnectorUpdateMessage {
                    header,
                    affected_connector,
                })
            }
            TemplateKind::ConnectorUnavailable => {
                OutboundMessage::ConnectorUnavailable(ConnectorUnavailableMessage {
                    header,
                    affected_connector,
                })
            }
        })
    }
}
