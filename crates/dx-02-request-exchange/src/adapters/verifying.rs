//! # Response Verifying Service
//!
//! `MessageService` decorator that checks the DAT of every answer before it
//! reaches classification. Rejections pass unchecked so the refusal reason
//! still reaches the caller.

use crate::ports::outbound::{MessageService, MessageServiceError};
use async_trait::async_trait;
use dx_01_token_verification::{ClaimsVerificationApi, TokenDecoder};
use shared_types::MessageEnvelope;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub struct VerifyingMessageService<M: MessageService> {
    inner: M,
    decoder: Arc<dyn TokenDecoder>,
    verifier: Arc<dyn ClaimsVerificationApi>,
}

impl<M: MessageService> VerifyingMessageService<M> {
    pub fn new(
        inner: M,
        decoder: Arc<dyn TokenDecoder>,
        verifier: Arc<dyn ClaimsVerificationApi>,
    ) -> Self {
        Self {
            inner,
            decoder,
            verifier,
        }
    }

    /// A missing or undecodable token verifies as absent claims.
    fn check(&self, target: &Url, response: &MessageEnvelope) -> Result<(), MessageServiceError> {
        if response.is_rejection() {
            debug!(target = %target, "Rejection answer, skipping token check");
            return Ok(());
        }

        let claims = match &response.header().security_token {
            Some(token) => match self.decoder.decode(token) {
                Ok(claims) => Some(claims),
                Err(err) => {
                    warn!(target = %target, error = %err, "Response token could not be decoded");
                    None
                }
            },
            None => None,
        };

        self.verifier.verify(claims.as_ref()).map(|_| ()).map_err(|err| {
            warn!(
                target = %target,
                kind = %response.kind(),
                error = %err,
                "Response claims rejected"
            );
            MessageServiceError::Claims(err)
        })
    }
}

#[async_trait]
impl<M: MessageService> MessageService for VerifyingMessageService<M> {
    async fn send(
        &self,
        target: &Url,
        envelope: MessageEnvelope,
    ) -> Result<MessageEnvelope, MessageServiceError> {
        let response = self.inner.send(target, envelope).await?;
        self.check(target, &response)?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RequestError;
    use crate::service::RequestService;
    use crate::testing::{RecordingTemplateProvider, Reply, ScriptedMessageService};
    use dx_01_token_verification::{ClaimsError, DecodeError, ManualTimeSource, TokenVerifier};
    use shared_types::{
        Claims, ConnectorIdentity, MessageKind, MessageProcessedNotificationMessage,
        RejectionReason, SecurityToken, Timestamp,
    };

    const NOW: Timestamp = 1_700_000_000;

    struct JsonDecoder;

    impl TokenDecoder for JsonDecoder {
        fn decode(&self, token: &SecurityToken) -> Result<Claims, DecodeError> {
            serde_json::from_str(&token.token_value)
                .map_err(|e| DecodeError::Malformed(e.to_string()))
        }
    }

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    fn requests(reply: Reply) -> (RequestService, Arc<ScriptedMessageService>) {
        let scripted = Arc::new(ScriptedMessageService::new(reply));
        let verifying = VerifyingMessageService::new(
            Arc::clone(&scripted),
            Arc::new(JsonDecoder),
            Arc::new(TokenVerifier::with_time_source(ManualTimeSource::new(NOW))),
        );
        let templates = Arc::new(RecordingTemplateProvider::new(ConnectorIdentity::new(url(
            "https://connector.example/",
        ))));
        (RequestService::multipart(templates, verifying), scripted)
    }

    /// Processed answer carrying `token` as its DAT.
    fn processed_with(token: Option<SecurityToken>) -> Reply {
        let responder = ConnectorIdentity::new(url("https://broker.example/"));
        let mut header = responder.header(MessageKind::MessageProcessedNotification, None);
        header.security_token = token;
        Reply::Envelope(MessageEnvelope::MessageProcessed {
            message: MessageProcessedNotificationMessage { header },
        })
    }

    fn dat(claims: &Claims) -> Option<SecurityToken> {
        Some(SecurityToken::jwt(serde_json::to_string(claims).unwrap()))
    }

    async fn announce(requests: &RequestService) -> Result<(), RequestError> {
        requests
            .connector::<String>()
            .operation_update(url("https://connector.example/"))
            .use_multipart()
            .execute(&url("https://broker.example/"))
            .await
            .map(|_| ())
    }

    // =========================================================================
    // Response tokens
    // =========================================================================

    #[tokio::test]
    async fn test_answer_without_token_fails_claims() {
        let (requests, scripted) = requests(Reply::Processed);

        let err = announce(&requests).await.unwrap_err();

        assert!(matches!(err, RequestError::Claims(ClaimsError::NullInput)));
        assert_eq!(scripted.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_answer_with_expired_token_fails_claims() {
        let expired = Claims::window(NOW - 7_200, NOW - 7_200, NOW - 3_600);
        let (requests, _) = requests(processed_with(dat(&expired)));

        let err = announce(&requests).await.unwrap_err();

        assert!(matches!(err, RequestError::Claims(ClaimsError::Outdated { .. })));
        assert_eq!(err.to_string(), "Response claims rejected: The token is outdated.");
    }

    #[tokio::test]
    async fn test_answer_with_garbled_token_fails_claims() {
        let (requests, _) = requests(processed_with(Some(SecurityToken::jwt("not json"))));

        let err = announce(&requests).await.unwrap_err();

        assert!(matches!(err, RequestError::Claims(ClaimsError::NullInput)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_answer_with_valid_token_passes() {
        let fresh = Claims::window(NOW - 10, NOW - 10, NOW + 3_600);
        let (requests, _) = requests(processed_with(dat(&fresh)));

        assert!(announce(&requests).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_is_classified_without_token() {
        let (requests, _) = requests(Reply::Reject(
            RejectionReason::NotAuthenticated,
            Some("The token is outdated.".to_string()),
        ));

        let response = requests
            .connector::<String>()
            .operation_delete(url("https://connector.example/"))
            .use_multipart()
            .execute(&url("https://broker.example/"))
            .await
            .unwrap();

        assert!(response.is_rejection());
        assert_eq!(response.payload().map(String::as_str), Some("The token is outdated."));
    }
}
