//! # Shared Types Crate
//!
//! This crate contains the DAT claims model, the dataspace message headers and
//! the `MessageEnvelope` family exchanged between connectors.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Closed Envelope Family**: Every (header, payload) pairing is a variant of
//!   `MessageEnvelope`; adding one is a compile-time checked change.
//! - **Payload Pairing**: `payload()` is `None` if and only if
//!   `serialize_payload()` yields `SerializedPayload::Empty`.

pub mod claims;
pub mod envelope;
pub mod messages;

pub use claims::{Claims, Timestamp};
pub use envelope::{HeaderMessageRef, MessageEnvelope, RawPayload, Rejection, SerializedPayload};
pub use messages::*;
