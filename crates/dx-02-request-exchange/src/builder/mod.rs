//! # Request Operation Builders
//!
//! Immutable builders that turn a (protocol, operation, target, payload)
//! configuration into exactly one outbound message, send it and classify the
//! answer.
//!
//! ## Shape
//!
//! Every configuration method consumes the builder and returns an updated
//! one. `execute` borrows the builder and works on its frozen `RequestConfig`,
//! so two call sites can never race on one builder.
//!
//! ```text
//! [Unconfigured] ──use_protocol / operation_*──→ [PartiallyConfigured]
//!        ──both set──→ [Configured] ──execute──→ Ok(container) | Err(kind)
//! ```
//!
//! The request subject `S` is a zero-sized marker choosing which operations
//! map to which message template.

use crate::domain::classification::classify;
use crate::domain::entities::{
    BuilderState, MessageContainer, Operation, ProtocolKind, RejectionPolicy, RequestConfig,
    TemplateKind, TemplateRequest,
};
use crate::domain::errors::{RequestError, UnsupportedKind};
use crate::domain::payload::ExpectedPayload;
use crate::ports::inbound::ExecutableRequest;
use crate::service::ExchangeContext;
use async_trait::async_trait;
use shared_types::{RawPayload, TypedLiteral};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

// =============================================================================
// REQUEST SUBJECTS (Zero-Sized Types)
// =============================================================================

/// What a request is about; decides the template for each operation.
pub trait RequestSubject: Send + Sync + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Template request for `operation`.
    ///
    /// # Errors
    /// - `RequestError::Unsupported` when the subject has no such operation
    /// - `RequestError::Precondition` when a subject field is unset
    fn template_request(
        config: &RequestConfig,
        operation: Operation,
        recipient: &Url,
    ) -> Result<TemplateRequest, RequestError>;
}

fn unsupported<S: RequestSubject>(operation: Operation) -> RequestError {
    RequestError::Unsupported(UnsupportedKind::Operation {
        subject: S::NAME,
        operation,
    })
}

/// Marker: certificate management at the certification body.
#[derive(Debug, Clone, Copy)]
pub struct ConnectorCertificate;

impl RequestSubject for ConnectorCertificate {
    const NAME: &'static str = "connector-certificate";

    fn template_request(
        config: &RequestConfig,
        operation: Operation,
        recipient: &Url,
    ) -> Result<TemplateRequest, RequestError> {
        match operation {
            Operation::Update => Ok(TemplateRequest {
                kind: TemplateKind::CertificateGranted,
                recipient: recipient.clone(),
                affected_connector: config.require_affected_connector()?,
                revocation_reason: None,
            }),
            Operation::Delete => {
                let (affected_connector, reason) = config.require_revocation()?;
                Ok(TemplateRequest {
                    kind: TemplateKind::CertificateRevoked,
                    recipient: recipient.clone(),
                    affected_connector,
                    revocation_reason: Some(reason),
                })
            }
            other => Err(unsupported::<Self>(other)),
        }
    }
}

/// Marker: connector self-description at a broker.
#[derive(Debug, Clone, Copy)]
pub struct Connector;

impl RequestSubject for Connector {
    const NAME: &'static str = "connector";

    fn template_request(
        config: &RequestConfig,
        operation: Operation,
        recipient: &Url,
    ) -> Result<TemplateRequest, RequestError> {
        let kind = match operation {
            Operation::Update => TemplateKind::ConnectorUpdate,
            Operation::Delete => TemplateKind::ConnectorUnavailable,
            other => return Err(unsupported::<Self>(other)),
        };
        Ok(TemplateRequest {
            kind,
            recipient: recipient.clone(),
            affected_connector: config.require_affected_connector()?,
            revocation_reason: None,
        })
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for one request about subject `S` expecting payload `T`.
#[must_use]
pub struct RequestOperationBuilder<T, S: RequestSubject> {
    context: Arc<ExchangeContext>,
    config: RequestConfig,
    _marker: PhantomData<fn() -> (T, S)>,
}

/// Certificate granted/revoked requests.
pub type ConnectorCertificateRequestBuilder<T> = RequestOperationBuilder<T, ConnectorCertificate>;

/// Connector update/unavailable requests.
pub type ConnectorRequestBuilder<T> = RequestOperationBuilder<T, Connector>;

impl<T, S: RequestSubject> RequestOperationBuilder<T, S> {
    pub(crate) fn new(context: Arc<ExchangeContext>) -> Self {
        let config = RequestConfig::with_policy(context.default_policy);
        Self {
            context,
            config,
            _marker: PhantomData,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<RawPayload>) -> Self {
        self.config.payload = Some(payload.into());
        self
    }

    pub fn with_rejection_policy(mut self, policy: RejectionPolicy) -> Self {
        self.config.set_rejection_policy(policy);
        self
    }

    pub fn throw_on_rejection(self) -> Self {
        self.with_rejection_policy(RejectionPolicy::ThrowOnRejection)
    }

    pub fn use_protocol(mut self, protocol: ProtocolKind) -> Self {
        self.config.protocol = Some(protocol);
        self
    }

    pub fn use_multipart(self) -> Self {
        self.use_protocol(ProtocolKind::Multipart)
    }

    /// Select an operation without subject fields.
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.config.operation = Some(operation);
        self
    }

    pub fn with_affected_connector(mut self, affected_connector: Url) -> Self {
        self.config.affected_connector = Some(affected_connector);
        self
    }

    pub fn state(&self) -> BuilderState {
        self.config.state()
    }

    /// Frozen snapshot `execute` works on.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }
}

impl<T> RequestOperationBuilder<T, ConnectorCertificate> {
    /// Announce a granted certificate for `affected_connector`.
    pub fn operation_update(self, affected_connector: Url) -> Self {
        self.with_operation(Operation::Update)
            .with_affected_connector(affected_connector)
    }

    /// Announce a revoked certificate for `affected_connector`.
    pub fn operation_delete(mut self, affected_connector: Url, reason: TypedLiteral) -> Self {
        self.config.revocation_reason = Some(reason);
        self.with_operation(Operation::Delete)
            .with_affected_connector(affected_connector)
    }
}

impl<T> RequestOperationBuilder<T, Connector> {
    /// Publish or refresh the self-description of `affected_connector`.
    pub fn operation_update(self, affected_connector: Url) -> Self {
        self.with_operation(Operation::Update)
            .with_affected_connector(affected_connector)
    }

    /// Announce that `affected_connector` goes offline.
    pub fn operation_delete(self, affected_connector: Url) -> Self {
        self.with_operation(Operation::Delete)
            .with_affected_connector(affected_connector)
    }
}

impl<T: ExpectedPayload, S: RequestSubject> RequestOperationBuilder<T, S> {
    /// Build, send and classify the configured request.
    ///
    /// # Errors
    /// - `Precondition` before any collaborator is called
    /// - `Unsupported` for a protocol without handler or an operation without
    ///   template; nothing is sent
    /// - template, transport and classification errors, each as its own kind
    pub async fn execute(&self, target: &Url) -> Result<MessageContainer<T>, RequestError> {
        let (protocol, operation) = self.config.require_protocol_and_operation()?;
        let handler = self.context.protocols.handler(protocol)?;
        let request = S::template_request(&self.config, operation, target)?;

        debug!(
            subject = S::NAME,
            protocol = %protocol,
            operation = %operation,
            target = %target,
            "Dispatching request"
        );

        let template = self.context.templates.template_for(&request)?;
        if template.kind() != request.kind.message_kind() {
            return Err(RequestError::Template(format!(
                "provider returned {} for {:?}",
                template.kind(),
                request.kind
            )));
        }

        let envelope = template.into_envelope(self.config.payload.clone());
        let response = handler.exchange(target, envelope).await?;
        let container = classify::<T>(response, self.config.rejection_policy).map_err(|err| {
            if let RequestError::Rejection { reason, .. } = &err {
                warn!(subject = S::NAME, target = %target, reason = %reason, "Request rejected");
            }
            err
        })?;

        match container.rejection() {
            Some(rejection) => warn!(
                subject = S::NAME,
                target = %target,
                reason = %rejection.reason,
                "Request rejected, propagating to caller"
            ),
            None => info!(
                subject = S::NAME,
                target = %target,
                response = %container.kind(),
                "Request completed"
            ),
        }
        Ok(container)
    }
}

#[async_trait]
impl<T: ExpectedPayload, S: RequestSubject> ExecutableRequest<T> for RequestOperationBuilder<T, S> {
    async fn execute(&self, target: &Url) -> Result<MessageContainer<T>, RequestError> {
        RequestOperationBuilder::execute(self, target).await
    }
}

impl<T, S: RequestSubject> Clone for RequestOperationBuilder<T, S> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, S: RequestSubject> fmt::Debug for RequestOperationBuilder<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOperationBuilder")
            .field("subject", &S::NAME)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OutboundMessage;
    use crate::ports::outbound::{MessageServiceError, TemplateProvider};
    use crate::service::RequestService;
    use crate::testing::{RecordingTemplateProvider, Reply, ScriptedMessageService};
    use shared_types::{ConnectorIdentity, MessageEnvelope, MessageKind, RejectionReason};

    // =========================================================================
    // Fixture
    // =========================================================================

    struct Fixture {
        service: RequestService,
        templates: Arc<RecordingTemplateProvider>,
        transport: Arc<ScriptedMessageService>,
    }

    fn fixture(reply: Reply) -> Fixture {
        let identity = ConnectorIdentity::new(url("https://connector.example/"));
        let templates = Arc::new(RecordingTemplateProvider::new(identity));
        let transport = Arc::new(ScriptedMessageService::new(reply));
        let service = RequestService::multipart(templates.clone(), transport.clone());
        Fixture {
            service,
            templates,
            transport,
        }
    }

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    fn target() -> Url {
        url("https://daps.example/certificates")
    }

    // =========================================================================
    // Preconditions and unsupported paths
    // =========================================================================

    #[tokio::test]
    async fn test_unconfigured_execute_names_both_fields() {
        let fx = fixture(Reply::Processed);
        let builder = fx.service.connector_certificate::<RawPayload>();
        assert_eq!(builder.state(), BuilderState::Unconfigured);

        let err = builder.execute(&target()).await.unwrap_err();
        match err {
            RequestError::Precondition { missing } => {
                assert_eq!(missing, vec!["protocol", "operation"]);
            }
            other => panic!("expected precondition error, got {other:?}"),
        }
        assert!(fx.templates.requests.lock().is_empty());
        assert_eq!(fx.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_idscp_and_ldp_are_not_implemented() {
        let fx = fixture(Reply::Processed);
        for protocol in [ProtocolKind::Idscp, ProtocolKind::Ldp] {
            for operation in [
                Operation::Create,
                Operation::Read,
                Operation::Update,
                Operation::Delete,
            ] {
                let err = fx
                    .service
                    .connector_certificate::<RawPayload>()
                    .use_protocol(protocol)
                    .with_operation(operation)
                    .with_affected_connector(url("https://other.example/"))
                    .execute(&target())
                    .await
                    .unwrap_err();
                assert_eq!(err.to_string(), "Not yet implemented Protocol!");
                assert!(err.is_programming_error());
            }
        }
        assert!(fx.templates.requests.lock().is_empty());
        assert_eq!(fx.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_create_is_unsupported_for_certificates() {
        let fx = fixture(Reply::Processed);
        let err = fx
            .service
            .connector_certificate::<RawPayload>()
            .use_multipart()
            .with_operation(Operation::Create)
            .execute(&target())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Unsupported(UnsupportedKind::Operation {
                operation: Operation::Create,
                ..
            })
        ));
        assert_eq!(err.to_string(), "Unsupported Operation!");
        assert_eq!(fx.transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_update_without_affected_connector() {
        let fx = fixture(Reply::Processed);
        let err = fx
            .service
            .connector::<RawPayload>()
            .use_multipart()
            .with_operation(Operation::Update)
            .execute(&target())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Precondition { ref missing } if missing == &vec!["affected_connector"]
        ));
    }

    #[tokio::test]
    async fn test_revocation_without_reason_is_precondition() {
        let fx = fixture(Reply::Processed);
        let builder = fx
            .service
            .connector_certificate::<RawPayload>()
            .use_multipart()
            .with_operation(Operation::Delete);

        let err = builder.execute(&target()).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Precondition { ref missing }
                if missing == &vec!["affected_connector", "revocation_reason"]
        ));

        let err = builder
            .with_affected_connector(url("https://other.example/"))
            .execute(&target())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Precondition { ref missing } if missing == &vec!["revocation_reason"]
        ));
        assert!(err.is_programming_error());
        assert!(fx.templates.requests.lock().is_empty());
        assert_eq!(fx.transport.sent_count(), 0);
    }

    #[test]
    fn test_policy_choice_moves_out_of_unconfigured() {
        let fx = fixture(Reply::Processed);
        let builder = fx.service.connector::<RawPayload>();
        assert_eq!(builder.state(), BuilderState::Unconfigured);

        let builder = builder.throw_on_rejection();
        assert_eq!(builder.state(), BuilderState::PartiallyConfigured);
    }

    // =========================================================================
    // Template dispatch
    // =========================================================================

    #[tokio::test]
    async fn test_update_requests_one_granted_template_and_forwards_it() {
        let fx = fixture(Reply::Processed);
        let affected = url("https://other.example/");

        let builder = fx
            .service
            .connector_certificate::<RawPayload>()
            .use_multipart()
            .operation_update(affected.clone());
        assert_eq!(builder.state(), BuilderState::Configured);

        let container = builder.execute(&target()).await.unwrap();
        assert_eq!(container.kind(), MessageKind::MessageProcessedNotification);

        let requests = fx.templates.requests.lock().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, TemplateKind::CertificateGranted);
        assert_eq!(requests[0].affected_connector, affected);

        let issued = fx.templates.issued.lock().clone();
        let sent = fx.transport.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, target());
        assert_eq!(sent[0].1, issued[0].clone().into_envelope(None));
    }

    #[tokio::test]
    async fn test_delete_requests_one_revoked_template_with_reason() {
        let fx = fixture(Reply::Processed);
        let affected = url("https://other.example/");
        let reason = TypedLiteral::new("private key leaked").with_language("en");

        fx.service
            .connector_certificate::<RawPayload>()
            .use_multipart()
            .operation_delete(affected.clone(), reason.clone())
            .execute(&target())
            .await
            .unwrap();

        let requests = fx.templates.requests.lock().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, TemplateKind::CertificateRevoked);
        assert_eq!(requests[0].affected_connector, affected);
        assert_eq!(requests[0].revocation_reason, Some(reason.clone()));

        let sent = fx.transport.sent.lock().clone();
        match &sent[0].1 {
            MessageEnvelope::CertificateRevoked { message, .. } => {
                assert_eq!(message.revocation_reason, reason);
            }
            other => panic!("unexpected envelope {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_connector_delete_sends_unavailable_with_payload() {
        let fx = fixture(Reply::Processed);
        fx.service
            .connector::<RawPayload>()
            .use_multipart()
            .with_payload("going offline for maintenance")
            .operation_delete(url("https://connector.example/"))
            .execute(&url("https://broker.example/infrastructure"))
            .await
            .unwrap();

        let issued = fx.templates.issued.lock().clone();
        assert!(matches!(issued[0], OutboundMessage::ConnectorUnavailable(_)));

        let sent = fx.transport.sent.lock().clone();
        assert_eq!(sent[0].1.kind(), MessageKind::ConnectorUnavailable);
        assert_eq!(
            sent[0].1.payload(),
            Some(RawPayload::from("going offline for maintenance"))
        );
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[tokio::test]
    async fn test_rejection_policies() {
        let fx = fixture(Reply::Reject(
            RejectionReason::NotAuthorized,
            Some("unknown connector".to_string()),
        ));
        let builder = fx
            .service
            .connector_certificate::<RawPayload>()
            .use_multipart()
            .operation_update(url("https://other.example/"));

        let propagated = builder.execute(&target()).await.unwrap();
        let rejection = propagated.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::NotAuthorized);
        assert_eq!(rejection.message.as_deref(), Some("unknown connector"));

        let err = builder.throw_on_rejection().execute(&target()).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Rejection { reason: RejectionReason::NotAuthorized, ref message }
                if message.as_deref() == Some("unknown connector")
        ));
        assert_eq!(fx.transport.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through_distinctly() {
        let fx = fixture(Reply::Fail(MessageServiceError::Send("connection refused".into())));
        let builder = fx
            .service
            .connector::<RawPayload>()
            .use_multipart()
            .operation_update(url("https://connector.example/"));

        let err = builder.execute(&target()).await.unwrap_err();
        assert!(matches!(err, RequestError::Transport(ref r) if r == "connection refused"));
        assert!(err.is_retryable());

        fx.transport
            .set_reply(Reply::Fail(MessageServiceError::MultipartParse("no boundary".into())));
        let err = builder.execute(&target()).await.unwrap_err();
        assert!(matches!(err, RequestError::MultipartParse(_)));

        fx.transport
            .set_reply(Reply::Fail(MessageServiceError::ShaclValidation("shape".into())));
        let err = builder.execute(&target()).await.unwrap_err();
        assert!(matches!(err, RequestError::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn test_non_response_answer_is_unknown_response() {
        let echo = fixture(Reply::Processed);
        let forged = echo
            .templates
            .template_for(&TemplateRequest {
                kind: TemplateKind::ConnectorUpdate,
                recipient: target(),
                affected_connector: url("https://other.example/"),
                revocation_reason: None,
            })
            .unwrap()
            .into_envelope(None);
        let fx = fixture(Reply::Envelope(forged));

        let err = fx
            .service
            .connector::<RawPayload>()
            .use_multipart()
            .operation_update(url("https://connector.example/"))
            .execute(&target())
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::UnknownResponse(_)));
    }

    #[tokio::test]
    async fn test_through_executable_request_trait() {
        async fn run(
            request: &dyn ExecutableRequest<RawPayload>,
            target: &Url,
        ) -> Result<MessageContainer<RawPayload>, RequestError> {
            request.execute(target).await
        }

        let fx = fixture(Reply::Processed);
        let builder = fx
            .service
            .connector::<RawPayload>()
            .use_multipart()
            .operation_update(url("https://connector.example/"));
        assert!(run(&builder, &target()).await.is_ok());
    }

    #[test]
    fn test_builders_are_independent_snapshots() {
        let fx = fixture(Reply::Processed);
        let base = fx.service.connector::<RawPayload>().use_multipart();
        let update = base.clone().operation_update(url("https://a.example/"));
        let delete = base.clone().operation_delete(url("https://b.example/"));

        assert_eq!(base.state(), BuilderState::PartiallyConfigured);
        assert_eq!(update.config().operation, Some(Operation::Update));
        assert_eq!(delete.config().operation, Some(Operation::Delete));
        assert_eq!(
            delete.config().affected_connector,
            Some(url("https://b.example/"))
        );
    }
}
