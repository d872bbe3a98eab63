//! # Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::{HandlerError, MessageResponse};
use async_trait::async_trait;
use shared_types::{Claims, MessageEnvelope};

/// Application logic for one kind of inbound message.
///
/// Called only after the sender's claims passed verification.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// # Errors
    /// `HandlerError` when the message cannot be processed.
    async fn handle(
        &self,
        envelope: &MessageEnvelope,
        claims: &Claims,
    ) -> Result<MessageResponse, HandlerError>;
}
