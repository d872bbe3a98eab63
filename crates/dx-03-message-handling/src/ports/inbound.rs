//! # Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::MessageEnvelope;

/// Entry point for messages received from remote connectors.
#[async_trait]
pub trait MessageDispatchApi: Send + Sync {
    /// Verify the sender and route the message to its handler.
    ///
    /// Never fails: every problem is answered with a `RejectionMessage`.
    async fn dispatch(&self, envelope: MessageEnvelope) -> MessageEnvelope;
}
