//! # Subsystem Wiring
//!
//! Builds each subsystem from configuration and connects its ports to the
//! runtime adapters.
//!
//! ```text
//!   RequestService ──MULTIPART──→ VerifyingMessageService ──→ LoopbackMessageService ──wire──→ MessageDispatcher
//!        │                          (answer DAT check)                                          │        │
//!   IdentityTemplateProvider                                                           TokenVerifier  HandlerRegistry
//!        │                                                                                      │        │
//!   DevTokenCodec (TokenSource)                                   DevTokenCodec (TokenDecoder/Source)  DirectoryHandler
//! ```
//!
//! Both directions use the same codec and verifier: answers are stamped by
//! the dispatcher and checked by the requester like any inbound message.

use crate::adapters::{
    ConnectorDirectory, DevTokenCodec, DirectoryHandler, LoopbackMessageService,
    SECURITY_PROFILE_CLAIM,
};
use crate::container::{ExchangeSettings, VerifierConfig};
use dx_01_token_verification::{
    ClaimsVerificationApi, RequiredClaimRule, SubjectAllowListRule, TimeSource, TokenDecoder,
    TokenVerifier,
};
use dx_02_request_exchange::{
    IdentityTemplateProvider, MultipartProtocol, ProtocolKind, ProtocolTable, RequestService,
    VerifyingMessageService,
};
use dx_03_message_handling::{HandlerRegistry, MessageHandler};
use shared_types::{ConnectorIdentity, MessageKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared clock handle used across the runtime.
pub type SharedClock = Arc<dyn TimeSource>;

/// Token codec shared between outgoing headers and inbound verification.
pub type SharedCodec = Arc<DevTokenCodec<SharedClock>>;

/// Verifier with the time checks plus the configured custom rules.
pub fn build_verifier(config: &VerifierConfig, clock: SharedClock) -> TokenVerifier<SharedClock> {
    let mut builder = TokenVerifier::builder(clock);

    if let Some(profile) = &config.required_security_profile {
        builder = builder.with_rule(RequiredClaimRule::equals(
            SECURITY_PROFILE_CLAIM,
            profile.clone(),
        ));
    }
    if !config.allowed_subjects.is_empty() {
        builder = builder.with_rule(SubjectAllowListRule::new(config.allowed_subjects.iter().cloned()));
    }

    let verifier = builder.build();
    info!(rules = ?verifier.rules().names(), "Token verifier ready");
    verifier
}

/// How answers to outgoing requests are authenticated.
#[derive(Clone)]
pub struct ResponseCheck {
    pub decoder: Arc<dyn TokenDecoder>,
    pub verifier: Arc<dyn ClaimsVerificationApi>,
}

/// Protocol table for the enabled protocols. Only multipart has a transport;
/// its answers go through `check` before classification.
pub fn build_protocols(
    settings: &ExchangeSettings,
    transport: Arc<LoopbackMessageService>,
    check: &ResponseCheck,
) -> ProtocolTable {
    let mut table = ProtocolTable::new();
    for protocol in &settings.enabled_protocols {
        match protocol {
            ProtocolKind::Multipart => {
                let verifying = VerifyingMessageService::new(
                    Arc::clone(&transport),
                    Arc::clone(&check.decoder),
                    Arc::clone(&check.verifier),
                );
                table = table.with_handler(Arc::new(MultipartProtocol::new(verifying)));
            }
            other => warn!(protocol = %other, "No transport for protocol, leaving it disabled"),
        }
    }
    table
}

/// Request service stamping `identity` and tokens from `codec` on every
/// outgoing header.
pub fn build_request_service(
    identity: ConnectorIdentity,
    codec: SharedCodec,
    settings: &ExchangeSettings,
    transport: Arc<LoopbackMessageService>,
    check: &ResponseCheck,
) -> RequestService {
    let templates = Arc::new(IdentityTemplateProvider::new(identity, codec));
    RequestService::new(
        templates,
        build_protocols(settings, transport, check),
        settings.rejection_policy,
    )
}

/// Registry with the directory handler on every connector lifecycle kind.
pub fn build_registry(handler: DirectoryHandler) -> Arc<HandlerRegistry> {
    let registry = Arc::new(HandlerRegistry::new());
    let handler: Arc<dyn MessageHandler> = Arc::new(handler);
    for kind in [
        MessageKind::ConnectorCertificateGranted,
        MessageKind::ConnectorCertificateRevoked,
        MessageKind::ConnectorUpdate,
        MessageKind::ConnectorUnavailable,
    ] {
        registry.register(kind, Arc::clone(&handler));
    }
    registry
}

/// Directory handler trusting this connector as certification body.
pub fn build_directory_handler(
    identity: &ConnectorIdentity,
    directory: Arc<ConnectorDirectory>,
) -> DirectoryHandler {
    DirectoryHandler::new(directory).trust_certification_body(identity.connector_id.clone())
}
