//! # Ports Layer
//!
//! - `inbound`: the verification API offered to other subsystems
//! - `outbound`: clock and token decoding dependencies

pub mod inbound;
pub mod outbound;
