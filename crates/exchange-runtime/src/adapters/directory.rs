//! # Connector Directory
//!
//! Broker-side state fed by inbound connector and certificate messages.
//!
//! A connector may only announce or withdraw itself. Certificate messages are
//! accepted from trusted certification bodies only.

use async_trait::async_trait;
use dx_03_message_handling::{HandlerError, MessageHandler, MessageResponse};
use parking_lot::RwLock;
use shared_types::{Claims, MessageEnvelope, MessageHeader, RawPayload, RejectionReason};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Last known state of a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorStatus {
    /// Announced itself; optional self-description text.
    Available { description: Option<String> },
    /// Withdrew itself.
    Unavailable,
    /// Certificate granted by a trusted body.
    Certified,
    /// Certificate revoked by a trusted body.
    Revoked { reason: String },
}

#[derive(Debug, Default)]
pub struct ConnectorDirectory {
    entries: RwLock<HashMap<Url, ConnectorStatus>>,
}

impl ConnectorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, connector: &Url) -> Option<ConnectorStatus> {
        self.entries.read().get(connector).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn record(&self, connector: Url, status: ConnectorStatus) -> Option<ConnectorStatus> {
        self.entries.write().insert(connector, status)
    }
}

/// Handler for the four connector lifecycle messages.
pub struct DirectoryHandler {
    directory: Arc<ConnectorDirectory>,
    certification_bodies: HashSet<Url>,
}

impl DirectoryHandler {
    pub fn new(directory: Arc<ConnectorDirectory>) -> Self {
        Self {
            directory,
            certification_bodies: HashSet::new(),
        }
    }

    /// Accept certificate messages issued by `body`.
    #[must_use]
    pub fn trust_certification_body(mut self, body: Url) -> Self {
        self.certification_bodies.insert(body);
        self
    }

    fn self_announcement(
        header: &MessageHeader,
        affected: &Url,
    ) -> Result<(), MessageResponse> {
        if &header.issuer_connector == affected {
            return Ok(());
        }
        Err(MessageResponse::error(
            RejectionReason::NotAuthorized,
            format!(
                "{} may not change the entry of {affected}",
                header.issuer_connector
            ),
        ))
    }

    fn certification_body(&self, header: &MessageHeader) -> Result<(), MessageResponse> {
        if self.certification_bodies.contains(&header.issuer_connector) {
            return Ok(());
        }
        Err(MessageResponse::error(
            RejectionReason::NotAuthorized,
            format!(
                "{} is not a trusted certification body",
                header.issuer_connector
            ),
        ))
    }
}

fn description_text(payload: &Option<RawPayload>) -> Result<Option<String>, HandlerError> {
    match payload {
        None => Ok(None),
        Some(RawPayload::Text(text)) => Ok(Some(text.clone())),
        Some(RawPayload::Json(value)) => Ok(Some(value.to_string())),
        Some(RawPayload::Binary(_)) => Err(HandlerError::BadParameters(
            "self-description must be text or JSON".to_string(),
        )),
    }
}

#[async_trait]
impl MessageHandler for DirectoryHandler {
    async fn handle(
        &self,
        envelope: &MessageEnvelope,
        claims: &Claims,
    ) -> Result<MessageResponse, HandlerError> {
        let header = envelope.header();

        // The DAT must belong to the connector named as issuer.
        if claims.subject.as_deref() != Some(header.issuer_connector.as_str()) {
            warn!(
                issuer = %header.issuer_connector,
                subject = ?claims.subject,
                "Token subject does not match issuer"
            );
            return Ok(MessageResponse::error(
                RejectionReason::NotAuthenticated,
                "Token was not issued to the issuer connector",
            ));
        }

        let (affected, status) = match envelope {
            MessageEnvelope::ConnectorUpdate { message, payload } => {
                if let Err(refusal) = Self::self_announcement(header, &message.affected_connector) {
                    return Ok(refusal);
                }
                let description = description_text(payload)?;
                (
                    message.affected_connector.clone(),
                    ConnectorStatus::Available { description },
                )
            }
            MessageEnvelope::ConnectorUnavailable { message, .. } => {
                if let Err(refusal) = Self::self_announcement(header, &message.affected_connector) {
                    return Ok(refusal);
                }
                (message.affected_connector.clone(), ConnectorStatus::Unavailable)
            }
            MessageEnvelope::CertificateGranted { message, .. } => {
                if let Err(refusal) = self.certification_body(header) {
                    return Ok(refusal);
                }
                (message.affected_connector.clone(), ConnectorStatus::Certified)
            }
            MessageEnvelope::CertificateRevoked { message, .. } => {
                if let Err(refusal) = self.certification_body(header) {
                    return Ok(refusal);
                }
                (
                    message.affected_connector.clone(),
                    ConnectorStatus::Revoked {
                        reason: message.revocation_reason.value.clone(),
                    },
                )
            }
            other => {
                return Err(HandlerError::BadParameters(format!(
                    "{} is not a connector lifecycle message",
                    other.kind()
                )))
            }
        };

        debug!(connector = %affected, status = ?status, "Updating directory entry");
        let previous = self.directory.record(affected.clone(), status);
        info!(
            connector = %affected,
            kind = %envelope.kind(),
            new_entry = previous.is_none(),
            "Directory updated"
        );
        Ok(MessageResponse::NoContent)
    }
}
