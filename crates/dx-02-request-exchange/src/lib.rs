//! # Request Exchange Subsystem (DX-02)
//!
//! Builds typed outbound messages, sends them over a supported protocol and
//! classifies the answer into success, rejection or a distinct failure kind.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): request config, payload types, classification, errors
//! - **Ports Layer** (`ports/`): `ExecutableRequest`, template provider, message service
//! - **Adapters** (`adapters/`): multipart protocol, identity template provider,
//!   response DAT verification
//! - **Builders** (`builder/`): immutable per-request builders
//! - **Service Layer** (`service.rs`): `RequestService` handing out builders
//!
//! ## Failure Taxonomy
//!
//! `execute` returns exactly one `RequestError` kind per failure. Transport,
//! serialization, schema and multipart faults are never merged.

pub mod adapters;
pub mod builder;
pub mod domain;
pub mod ports;
pub mod protocol;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export public API
pub use adapters::{IdentityTemplateProvider, MultipartProtocol, VerifyingMessageService};
pub use builder::{
    Connector, ConnectorCertificate, ConnectorCertificateRequestBuilder, ConnectorRequestBuilder,
    RequestOperationBuilder, RequestSubject,
};
pub use domain::classification::classify;
pub use domain::entities::{
    BuilderState, MessageContainer, Operation, OutboundMessage, ProtocolKind, RejectionPolicy,
    RequestConfig, ResponseMeta, TemplateKind, TemplateRequest,
};
pub use domain::errors::{RequestError, UnsupportedKind};
pub use domain::payload::{ExpectedPayload, Json};
pub use ports::inbound::ExecutableRequest;
pub use ports::outbound::{
    MessageService, MessageServiceError, ProtocolHandler, TemplateError, TemplateProvider,
    TokenSource, TokenSourceError,
};
pub use protocol::ProtocolTable;
pub use service::{ExchangeContext, RequestService};
