//! # Loopback Message Service
//!
//! In-process `MessageService`: every message and answer is pushed through
//! the multipart wire codec, so both sides see exactly what a remote peer
//! would. Endpoints map to local dispatchers.

use super::wire::{decode, encode};
use async_trait::async_trait;
use dx_02_request_exchange::{MessageService, MessageServiceError};
use dx_03_message_handling::MessageDispatchApi;
use parking_lot::RwLock;
use shared_types::MessageEnvelope;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

#[derive(Default)]
pub struct LoopbackMessageService {
    routes: RwLock<HashMap<Url, Arc<dyn MessageDispatchApi>>>,
}

impl LoopbackMessageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver messages addressed to `endpoint` to `dispatcher`.
    pub fn register_route(&self, endpoint: Url, dispatcher: Arc<dyn MessageDispatchApi>) {
        info!(endpoint = %endpoint, "Registered loopback route");
        self.routes.write().insert(endpoint, dispatcher);
    }

    pub fn has_route(&self, endpoint: &Url) -> bool {
        self.routes.read().contains_key(endpoint)
    }

    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }
}

#[async_trait]
impl MessageService for LoopbackMessageService {
    async fn send(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, MessageServiceError> {
        let dispatcher = self
            .routes
            .read()
            .get(target)
            .cloned()
            .ok_or_else(|| MessageServiceError::Send(format!("no route to {target}")))?;

        let request = encode(&envelope)?;
        debug!(target = %target, bytes = request.len(), "Loopback request frame");
        let inbound = decode(&request)?;

        let answer = dispatcher.dispatch(inbound).await;

        let response = encode(&answer)?;
        debug!(target = %target, bytes = response.len(), "Loopback response frame");
        decode(&response)
    }
}
