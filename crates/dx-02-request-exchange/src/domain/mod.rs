//! # Domain Layer
//!
//! Request configuration, expected payload types, response classification and
//! the request error taxonomy.

pub mod classification;
pub mod entities;
pub mod errors;
pub mod payload;

pub use classification::classify;
pub use entities::{
    BuilderState, MessageContainer, Operation, OutboundMessage, ProtocolKind, RejectionPolicy,
    RequestConfig, ResponseMeta, TemplateKind, TemplateRequest,
};
pub use errors::{RequestError, UnsupportedKind};
pub use payload::{ExpectedPayload, Json};
