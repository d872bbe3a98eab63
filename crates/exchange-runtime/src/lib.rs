//! # Dataspace Exchange Runtime
//!
//! Wires the exchange subsystems into one connector process.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration with environment overrides
//! - `telemetry` - Logging subscriber setup
//! - `adapters/` - Port implementations (token codec, wire, loopback, directory)
//! - `wiring/` - Builds each subsystem from configuration
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + env)
//! 2. Install logging
//! 3. Validate configuration
//! 4. Build verifier, request service and dispatcher
//! 5. Route this connector's own endpoint to its dispatcher
//! 6. Self-check: announce this connector to itself over the wire, with the
//!    answer's DAT checked like any other response

pub mod adapters;
pub mod container;
pub mod telemetry;
pub mod wiring;

use std::sync::Arc;

use dx_01_token_verification::{ClaimsVerificationApi, SystemTimeSource};
use dx_02_request_exchange::{RequestError, RequestService};
use dx_03_message_handling::MessageDispatcher;
use shared_types::{ConnectorIdentity, MessageKind, RawPayload};
use tracing::info;

use crate::adapters::{ConnectorDirectory, ConnectorStatus, DevTokenCodec, LoopbackMessageService};
use crate::container::{ConfigError, ExchangeConfig, BASE_SECURITY_PROFILE};
use crate::wiring::SharedClock;

/// Outcome of the startup self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheckReport {
    pub response_kind: MessageKind,
    pub own_status: Option<ConnectorStatus>,
    pub directory_entries: usize,
}

/// A fully wired connector.
pub struct ExchangeRuntime {
    config: ExchangeConfig,
    identity: ConnectorIdentity,
    verifier: Arc<dyn ClaimsVerificationApi>,
    requests: RequestService,
    dispatcher: Arc<MessageDispatcher>,
    directory: Arc<ConnectorDirectory>,
    loopback: Arc<LoopbackMessageService>,
}

impl ExchangeRuntime {
    /// Runtime on the wall clock.
    ///
    /// # Errors
    /// `ConfigError` when the configuration does not validate.
    pub fn new(config: ExchangeConfig) -> Result<Self, ConfigError> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(config: ExchangeConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;
        let identity = config.identity()?;
        info!(connector = %identity.connector_id, "Creating exchange runtime");

        let profile = config
            .verifier
            .required_security_profile
            .clone()
            .unwrap_or_else(|| BASE_SECURITY_PROFILE.to_string());
        let codec = Arc::new(
            DevTokenCodec::new(
                identity.connector_id.to_string(),
                config.connector.token_ttl_secs,
                Arc::clone(&clock),
            )
            .with_security_profile(profile),
        );

        let verifier: Arc<dyn ClaimsVerificationApi> =
            Arc::new(wiring::build_verifier(&config.verifier, clock));

        let directory = Arc::new(ConnectorDirectory::new());
        let registry = wiring::build_registry(wiring::build_directory_handler(
            &identity,
            Arc::clone(&directory),
        ));
        let dispatcher = Arc::new(
            MessageDispatcher::new(identity.clone(), Arc::clone(&verifier), codec.clone(), registry)
                .with_token_source(codec.clone()),
        );

        let loopback = Arc::new(LoopbackMessageService::new());
        loopback.register_route(identity.connector_id.clone(), dispatcher.clone());

        let check = wiring::ResponseCheck {
            decoder: codec.clone(),
            verifier: Arc::clone(&verifier),
        };
        let requests = wiring::build_request_service(
            identity.clone(),
            codec,
            &config.exchange,
            Arc::clone(&loopback),
            &check,
        );

        Ok(Self {
            config,
            identity,
            verifier,
            requests,
            dispatcher,
            directory,
            loopback,
        })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn identity(&self) -> &ConnectorIdentity {
        &self.identity
    }

    pub fn verifier(&self) -> &Arc<dyn ClaimsVerificationApi> {
        &self.verifier
    }

    /// Factory for outgoing requests.
    pub fn requests(&self) -> &RequestService {
        &self.requests
    }

    /// Inbound side; hand this to a transport that accepts remote messages.
    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    pub fn directory(&self) -> &Arc<ConnectorDirectory> {
        &self.directory
    }

    pub fn loopback(&self) -> &Arc<LoopbackMessageService> {
        &self.loopback
    }

    /// Send a `ConnectorUpdateMessage` about this connector to its own
    /// endpoint. Exercises token issuing, the wire codec, claims verification
    /// and dispatch in one round trip.
    ///
    /// # Errors
    /// Any `RequestError`; a rejection is an error here.
    pub async fn self_check(&self) -> Result<SelfCheckReport, RequestError> {
        let endpoint = self.identity.connector_id.clone();
        let response = self
            .requests
            .connector::<RawPayload>()
            .operation_update(endpoint.clone())
            .use_multipart()
            .with_payload(self.config.telemetry.service_name.clone())
            .throw_on_rejection()
            .execute(&endpoint)
            .await?;

        let report = SelfCheckReport {
            response_kind: response.kind(),
            own_status: self.directory.status(&endpoint),
            directory_entries: self.directory.len(),
        };
        info!(
            kind = %report.response_kind,
            entries = report.directory_entries,
            "Self-check passed"
        );
        Ok(report)
    }
}
