//! # Verification Flows
//!
//! DATs issued by one connector, decoded and verified by another before the
//! message reaches a handler.
//!
//! ## Flow Tested
//!
//! 1. **Token issuing (runtime codec) → header**: the DAT travels in the header
//! 2. **Dispatch (dx-03) → verifier (dx-01)**: time checks, then custom rules
//! 3. **Verifier outcome → answer**: handler result or `NOT_AUTHENTICATED`

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use url::Url;

    use dx_01_token_verification::{
        ClaimsVerificationApi, FnRule, ManualTimeSource, RuleResult, TokenVerifier,
    };
    use dx_02_request_exchange::TokenSource;
    use dx_03_message_handling::{
        HandlerError, HandlerRegistry, MessageDispatchApi, MessageDispatcher, MessageHandler,
        MessageResponse,
    };
    use exchange_runtime::adapters::DevTokenCodec;
    use shared_types::{
        Claims, ConnectorIdentity, ConnectorUpdateMessage, MessageEnvelope, MessageKind,
        RejectionReason, Timestamp,
    };

    const T: Timestamp = 1_700_000_000;
    const PROVIDER: &str = "https://provider.example/";
    const BROKER: &str = "https://broker.example/";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Acknowledges everything and records the subject it was called for.
    struct RecordingHandler {
        subjects: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn handle(
            &self,
            _envelope: &MessageEnvelope,
            claims: &Claims,
        ) -> Result<MessageResponse, HandlerError> {
            self.subjects.lock().push(claims.subject.clone());
            Ok(MessageResponse::NoContent)
        }
    }

    struct Fixture {
        dispatcher: MessageDispatcher,
        broker_clock: Arc<ManualTimeSource>,
        handled: Arc<Mutex<Vec<Option<String>>>>,
    }

    fn fixture(
        verifier: TokenVerifier<Arc<ManualTimeSource>>,
        broker_clock: Arc<ManualTimeSource>,
    ) -> Fixture {
        let handled = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(HandlerRegistry::new());
        registry.register(
            MessageKind::ConnectorUpdate,
            Arc::new(RecordingHandler {
                subjects: Arc::clone(&handled),
            }),
        );

        let decoder = Arc::new(DevTokenCodec::new(BROKER, 60, ManualTimeSource::new(T)));
        let dispatcher = MessageDispatcher::new(
            ConnectorIdentity::new(Url::parse(BROKER).unwrap()),
            Arc::new(verifier),
            decoder,
            registry,
        );
        Fixture {
            dispatcher,
            broker_clock,
            handled,
        }
    }

    /// A ConnectorUpdate from the provider carrying a DAT issued at `T`.
    fn update_with_token(ttl: u64) -> MessageEnvelope {
        let provider_clock = ManualTimeSource::new(T);
        let codec = DevTokenCodec::new(PROVIDER, ttl, provider_clock);
        let identity = ConnectorIdentity::new(Url::parse(PROVIDER).unwrap());

        let mut header = identity.header(MessageKind::ConnectorUpdate, None);
        header.security_token = Some(codec.current_token().unwrap());
        MessageEnvelope::ConnectorUpdate {
            message: ConnectorUpdateMessage {
                header,
                affected_connector: identity.connector_id.clone(),
            },
            payload: None,
        }
    }

    fn rejection_of(answer: &MessageEnvelope) -> (RejectionReason, String) {
        let rejection = answer.rejection().expect("expected a rejection");
        (rejection.reason, rejection.message.unwrap_or_default())
    }

    // =============================================================================
    // INTEGRATION TESTS: TIME VALIDITY
    // =============================================================================

    /// Token valid for one hour, checked ten seconds after issue.
    #[tokio::test]
    async fn test_fresh_token_reaches_handler() {
        let clock = Arc::new(ManualTimeSource::new(T + 10));
        let fx = fixture(TokenVerifier::with_time_source(Arc::clone(&clock)), clock);

        let answer = fx.dispatcher.dispatch(update_with_token(3_600)).await;

        assert_eq!(answer.kind(), MessageKind::MessageProcessedNotification);
        assert_eq!(fx.handled.lock().as_slice(), &[Some(PROVIDER.to_string())]);
    }

    /// Same token, checked after it expired.
    #[tokio::test]
    async fn test_expired_token_is_not_authenticated() {
        let clock = Arc::new(ManualTimeSource::new(T + 10));
        let fx = fixture(TokenVerifier::with_time_source(Arc::clone(&clock)), clock);
        fx.broker_clock.set(T + 3_700);

        let answer = fx.dispatcher.dispatch(update_with_token(3_600)).await;

        let (reason, text) = rejection_of(&answer);
        assert_eq!(reason, RejectionReason::NotAuthenticated);
        assert_eq!(text, "The token is outdated.");
        assert!(fx.handled.lock().is_empty());
    }

    /// Broker clock running behind the issuer: the token is from the future.
    #[tokio::test]
    async fn test_token_from_the_future_is_refused() {
        let clock = Arc::new(ManualTimeSource::new(T - 30));
        let fx = fixture(TokenVerifier::with_time_source(Arc::clone(&clock)), clock);

        let answer = fx.dispatcher.dispatch(update_with_token(3_600)).await;

        let (reason, text) = rejection_of(&answer);
        assert_eq!(reason, RejectionReason::NotAuthenticated);
        assert!(text.contains("issued time"));
    }

    // =============================================================================
    // INTEGRATION TESTS: CUSTOM RULES
    // =============================================================================

    /// Rules run in registration order and stop at the first failure.
    #[tokio::test]
    async fn test_rules_fail_fast_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let clock = Arc::new(ManualTimeSource::new(T + 10));

        let first_calls = Arc::clone(&calls);
        let second_calls = Arc::clone(&calls);
        let verifier = TokenVerifier::builder(Arc::clone(&clock))
            .with_rule(FnRule::new("issuer-blocked", move |claims: &Claims| {
                first_calls.lock().push("issuer-blocked");
                let blocked = claims.subject.as_deref() == Some(PROVIDER);
                Ok(RuleResult::new(!blocked, "provider is suspended"))
            }))
            .with_rule(FnRule::new("never-reached", move |_: &Claims| {
                second_calls.lock().push("never-reached");
                Ok(RuleResult::ok())
            }))
            .build();
        assert_eq!(verifier.rule_count(), 2);

        let fx = fixture(verifier, clock);
        let answer = fx.dispatcher.dispatch(update_with_token(3_600)).await;

        let (reason, text) = rejection_of(&answer);
        assert_eq!(reason, RejectionReason::NotAuthenticated);
        assert_eq!(text, "Custom Rule failed! Message: provider is suspended");
        assert_eq!(calls.lock().as_slice(), &["issuer-blocked"]);
    }

    /// Time checks run before any custom rule.
    #[tokio::test]
    async fn test_time_checks_precede_rules() {
        let calls = Arc::new(Mutex::new(0usize));
        let clock = Arc::new(ManualTimeSource::new(T + 7_200));

        let counter = Arc::clone(&calls);
        let verifier = TokenVerifier::builder(Arc::clone(&clock))
            .with_rule(FnRule::new("counting", move |_: &Claims| {
                *counter.lock() += 1;
                Ok(RuleResult::ok())
            }))
            .build();

        let fx = fixture(verifier, clock);
        let answer = fx.dispatcher.dispatch(update_with_token(3_600)).await;

        assert_eq!(rejection_of(&answer).0, RejectionReason::NotAuthenticated);
        assert_eq!(*calls.lock(), 0);
    }

    // =============================================================================
    // INTEGRATION TESTS: DISPATCH EDGES
    // =============================================================================

    #[tokio::test]
    async fn test_message_without_token_is_refused() {
        let clock = Arc::new(ManualTimeSource::new(T));
        let fx = fixture(TokenVerifier::with_time_source(Arc::clone(&clock)), clock);

        let mut envelope = update_with_token(3_600);
        if let MessageEnvelope::ConnectorUpdate { message, .. } = &mut envelope {
            message.header.security_token = None;
        }
        let answer = fx.dispatcher.dispatch(envelope).await;

        assert_eq!(rejection_of(&answer).0, RejectionReason::NotAuthenticated);
        assert!(fx.handled.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unhandled_kind_is_not_supported() {
        let clock = Arc::new(ManualTimeSource::new(T + 10));
        let fx = fixture(TokenVerifier::with_time_source(Arc::clone(&clock)), clock);

        let request = update_with_token(3_600);
        let identity = ConnectorIdentity::new(Url::parse(PROVIDER).unwrap());
        let mut header = identity.header(MessageKind::ConnectorUnavailable, None);
        header.security_token = request.header().security_token.clone();
        let request_id = header.id.clone();
        let unavailable = MessageEnvelope::ConnectorUnavailable {
            message: shared_types::ConnectorUnavailableMessage {
                header,
                affected_connector: identity.connector_id.clone(),
            },
            payload: None,
        };

        let answer = fx.dispatcher.dispatch(unavailable).await;

        assert_eq!(rejection_of(&answer).0, RejectionReason::MessageTypeNotSupported);
        assert_eq!(answer.header().correlation_message, Some(request_id));
    }
}
