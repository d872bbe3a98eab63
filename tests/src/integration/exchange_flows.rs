//! # Exchange Flows
//!
//! Requests built by one connector, carried over the multipart wire codec and
//! answered by another connector's dispatcher.
//!
//! ## Flow Tested
//!
//! 1. **Builder (dx-02) → template → protocol**: header, DAT and payload
//! 2. **Loopback wire → dispatcher (dx-03)**: decode, verify, route, stamp
//! 3. **Answer DAT check → classification**: container, propagated or thrown
//!    rejection, or refused claims

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;
    use url::Url;

    use dx_01_token_verification::{ClaimsError, ManualTimeSource};
    use dx_02_request_exchange::testing::{RecordingTemplateProvider, Reply, ScriptedMessageService};
    use dx_02_request_exchange::{
        BuilderState, Operation, ProtocolKind, RejectionPolicy, RequestError, RequestService,
        TemplateKind,
    };
    use dx_03_message_handling::MessageDispatcher;
    use exchange_runtime::adapters::{ConnectorStatus, DevTokenCodec};
    use exchange_runtime::container::ExchangeConfig;
    use exchange_runtime::ExchangeRuntime;
    use shared_types::{
        ConnectorIdentity, DescriptionResponseMessage, MessageEnvelope, MessageKind, RawPayload,
        RejectionReason, ResultMessage, Timestamp, TypedLiteral,
    };

    const T: Timestamp = 1_700_000_000;
    const PROVIDER: &str = "https://provider.example/";
    const BROKER: &str = "https://broker.example/";
    const LEGACY: &str = "https://legacy.example/";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    // =============================================================================
    // TEST FIXTURES: TWO CONNECTORS
    // =============================================================================

    struct Dataspace {
        provider: ExchangeRuntime,
        broker: ExchangeRuntime,
        broker_clock: Arc<ManualTimeSource>,
    }

    /// Provider and broker on aligned clocks, with the broker's dispatcher
    /// reachable from the provider's loopback.
    fn dataspace() -> Dataspace {
        let mut provider_config = ExchangeConfig::default();
        provider_config.connector.connector_id = PROVIDER.to_string();
        let mut broker_config = ExchangeConfig::default();
        broker_config.connector.connector_id = BROKER.to_string();

        let broker_clock = Arc::new(ManualTimeSource::new(T));
        let provider =
            ExchangeRuntime::with_time_source(provider_config, Arc::new(ManualTimeSource::new(T)))
                .unwrap();
        let broker = ExchangeRuntime::with_time_source(broker_config, broker_clock.clone()).unwrap();

        provider
            .loopback()
            .register_route(url(BROKER), broker.dispatcher().clone());

        Dataspace {
            provider,
            broker,
            broker_clock,
        }
    }

    // =============================================================================
    // INTEGRATION TESTS: CONNECTOR TO CONNECTOR
    // =============================================================================

    #[tokio::test]
    async fn test_provider_announces_itself_to_broker() {
        let ds = dataspace();

        let response = ds
            .provider
            .requests()
            .connector::<String>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .with_payload(serde_json::json!({"title": "Weather data"}))
            .execute(&url(BROKER))
            .await
            .unwrap();

        assert_eq!(response.kind(), MessageKind::MessageProcessedNotification);
        assert!(!response.is_rejection());
        assert!(response.payload().is_none());
        assert_eq!(response.header().issuer_connector, url(BROKER));
        assert!(response.header().security_token.is_some());

        assert_eq!(
            ds.broker.directory().status(&url(PROVIDER)),
            Some(ConnectorStatus::Available {
                description: Some(r#"{"title":"Weather data"}"#.to_string())
            })
        );
        assert!(ds.provider.directory().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_rejection_is_propagated() {
        let ds = dataspace();
        ds.broker_clock.set(T + 3_700);

        let response = ds
            .provider
            .requests()
            .connector::<String>()
            .operation_delete(url(PROVIDER))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap();

        assert!(response.is_rejection());
        let rejection = response.rejection().unwrap();
        assert_eq!(rejection.reason, RejectionReason::NotAuthenticated);
        assert_eq!(response.payload().map(String::as_str), Some("The token is outdated."));
        assert!(ds.broker.directory().is_empty());
    }

    #[tokio::test]
    async fn test_untrusted_revocation_is_thrown() {
        let ds = dataspace();

        let err = ds
            .provider
            .requests()
            .connector_certificate::<String>()
            .operation_delete(url("https://consumer.example/"), TypedLiteral::new("expired"))
            .use_multipart()
            .throw_on_rejection()
            .execute(&url(BROKER))
            .await
            .unwrap_err();

        match err {
            RequestError::Rejection { reason, message } => {
                assert_eq!(reason, RejectionReason::NotAuthorized);
                assert!(message.unwrap().contains("not a trusted certification body"));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_with_non_text_expectation_drops_payload() {
        let ds = dataspace();
        ds.broker_clock.set(T + 3_700);

        let response = ds
            .provider
            .requests()
            .connector::<Value>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap();

        assert!(response.is_rejection());
        assert!(response.payload().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let ds = dataspace();

        let err = ds
            .provider
            .requests()
            .connector::<String>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .execute(&url("https://nowhere.example/"))
            .await
            .unwrap_err();

        assert!(matches!(err, RequestError::Transport(_)));
        assert!(err.is_retryable());
    }

    // =============================================================================
    // INTEGRATION TESTS: ANSWER TOKENS
    // =============================================================================

    /// Broker clock ahead: the request is accepted, but its answer carries a
    /// DAT issued in the provider's future.
    #[tokio::test]
    async fn test_answer_from_skewed_broker_fails_claims() {
        let ds = dataspace();
        ds.broker_clock.set(T + 30);

        let err = ds
            .provider
            .requests()
            .connector::<String>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RequestError::Claims(ClaimsError::IssuedTimeInvalid { .. })
        ));
        assert!(!err.is_retryable());
        assert!(ds.broker.directory().status(&url(PROVIDER)).is_some());
    }

    /// A counterpart that answers without a DAT is not trusted.
    #[tokio::test]
    async fn test_unsigned_answer_fails_claims() {
        let ds = dataspace();
        let legacy = MessageDispatcher::new(
            ConnectorIdentity::new(url(LEGACY)),
            Arc::clone(ds.broker.verifier()),
            Arc::new(DevTokenCodec::new(LEGACY, 60, ManualTimeSource::new(T))),
            Arc::clone(ds.broker.dispatcher().registry()),
        );
        ds.provider.loopback().register_route(url(LEGACY), Arc::new(legacy));

        let err = ds
            .provider
            .requests()
            .connector::<String>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .throw_on_rejection()
            .execute(&url(LEGACY))
            .await
            .unwrap_err();

        assert!(matches!(err, RequestError::Claims(ClaimsError::NullInput)));
    }

    // =============================================================================
    // INTEGRATION TESTS: SCRIPTED COUNTERPART
    // =============================================================================

    fn scripted(reply: Reply) -> (RequestService, Arc<RecordingTemplateProvider>, Arc<ScriptedMessageService>) {
        let templates = Arc::new(RecordingTemplateProvider::new(ConnectorIdentity::new(url(PROVIDER))));
        let service = Arc::new(ScriptedMessageService::new(reply));
        let requests = RequestService::multipart(templates.clone(), Arc::clone(&service));
        (requests, templates, service)
    }

    #[tokio::test]
    async fn test_revocation_template_and_result_payload() {
        let identity = ConnectorIdentity::new(url("https://responder.test/"));
        let request_header = identity.header(MessageKind::ConnectorCertificateRevoked, None);
        let answer = MessageEnvelope::Result {
            message: ResultMessage {
                header: identity.response_header(MessageKind::Result, &request_header),
            },
            payload: "revocation stored".to_string(),
        };
        let (requests, templates, service) = scripted(Reply::Envelope(answer));

        let response = requests
            .connector_certificate::<String>()
            .operation_delete(url("https://consumer.example/"), TypedLiteral::new("key leaked"))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap();

        assert_eq!(response.payload().map(String::as_str), Some("revocation stored"));

        let asked = templates.requests.lock();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].kind, TemplateKind::CertificateRevoked);
        assert_eq!(asked[0].recipient, url(BROKER));
        assert_eq!(
            asked[0].revocation_reason.as_ref().map(|r| r.value.as_str()),
            Some("key leaked")
        );

        let sent = service.sent.lock();
        let (target, envelope) = &sent[0];
        assert_eq!(target, &url(BROKER));
        assert_eq!(envelope.kind(), MessageKind::ConnectorCertificateRevoked);
        assert_eq!(
            envelope.header().security_token.as_ref().map(|t| t.token_value.as_str()),
            Some("test-dat")
        );
        assert!(envelope.payload().is_none());
    }

    #[tokio::test]
    async fn test_payload_type_mismatch() {
        let identity = ConnectorIdentity::new(url("https://responder.test/"));
        let answer = MessageEnvelope::Description {
            message: DescriptionResponseMessage {
                header: identity.header(MessageKind::DescriptionResponse, None),
            },
            payload: serde_json::json!({"@id": PROVIDER}),
        };
        let (requests, _, _) = scripted(Reply::Envelope(answer));

        let err = requests
            .connector::<String>()
            .operation_update(url(PROVIDER))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RequestError::UnexpectedPayload { expected: "text", actual: "json" }
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_request_sends_nothing() {
        let (requests, templates, service) = scripted(Reply::Processed);

        let builder = requests
            .connector::<RawPayload>()
            .with_payload("draft")
            .with_affected_connector(url(PROVIDER));
        assert_eq!(builder.state(), BuilderState::PartiallyConfigured);

        let err = builder.execute(&url(BROKER)).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Precondition { ref missing } if missing == &vec!["protocol", "operation"]
        ));

        let err = builder
            .use_protocol(ProtocolKind::Idscp)
            .with_operation(Operation::Update)
            .execute(&url(BROKER))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not yet implemented Protocol!");

        assert_eq!(service.sent_count(), 0);
        assert!(templates.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_default_policy_applies_to_new_builders() {
        let (requests, _, service) = scripted(Reply::Reject(
            RejectionReason::NotFound,
            Some("unknown connector".to_string()),
        ));
        assert_eq!(requests.default_policy(), RejectionPolicy::Propagate);

        let response = requests
            .connector::<String>()
            .operation_delete(url(PROVIDER))
            .use_multipart()
            .execute(&url(BROKER))
            .await
            .unwrap();

        assert_eq!(response.rejection().unwrap().reason, RejectionReason::NotFound);
        assert_eq!(response.payload().map(String::as_str), Some("unknown connector"));
        assert_eq!(service.sent_count(), 1);
    }
}
