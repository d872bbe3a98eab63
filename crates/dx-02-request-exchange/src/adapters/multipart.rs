//! # Multipart Protocol Adapter
//!
//! Carries header and payload as two parts of one exchange. Framing is done
//! by the underlying `MessageService`; this adapter checks that what came
//! back is an answer at all.

use crate::domain::entities::ProtocolKind;
use crate::domain::errors::RequestError;
use crate::ports::outbound::{MessageService, ProtocolHandler};
use async_trait::async_trait;
use shared_types::MessageEnvelope;
use tracing::debug;
use url::Url;

pub struct MultipartProtocol<M: MessageService> {
    service: M,
}

impl<M: MessageService> MultipartProtocol<M> {
    pub fn new(service: M) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<M: MessageService> ProtocolHandler for MultipartProtocol<M> {
    fn protocol(&self) -> ProtocolKind {
        ProtocolKind::Multipart
    }

    async fn exchange(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, RequestError> {
        let request_kind = envelope.kind();
        debug!(target = %target, kind = %request_kind, "Sending multipart message");

        let response = self.service.send(target, envelope).await?;

        if !response.kind().is_response() {
            return Err(RequestError::UnknownResponse(format!(
                "{} is not a valid answer to {}",
                response.kind(),
                request_kind
            )));
        }
        debug!(target = %target, kind = %response.kind(), "Received multipart response");
        Ok(response)
    }
}
