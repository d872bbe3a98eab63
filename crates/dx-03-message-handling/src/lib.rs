//! # Message Handling Subsystem (DX-03)
//!
//! Receives messages from remote connectors, verifies the sender's DAT and
//! routes each message to the handler registered for its kind.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): handler outcomes and errors
//! - **Ports Layer** (`ports/`): `MessageDispatchApi` in, `MessageHandler` out
//! - **Registry** (`registry.rs`): message kind to handler map
//! - **Service Layer** (`service.rs`): `MessageDispatcher`
//!
//! ## Answers
//!
//! Dispatch always yields an envelope. Unauthenticated senders get
//! `NOT_AUTHENTICATED`, unknown kinds get `MESSAGE_TYPE_NOT_SUPPORTED` and
//! handler faults get `INTERNAL_RECIPIENT_ERROR`.

pub mod domain;
pub mod ports;
pub mod registry;
pub mod service;

// Re-export public API
pub use domain::entities::{HandlerError, MessageResponse};
pub use ports::inbound::MessageDispatchApi;
pub use ports::outbound::MessageHandler;
pub use registry::HandlerRegistry;
pub use service::MessageDispatcher;
