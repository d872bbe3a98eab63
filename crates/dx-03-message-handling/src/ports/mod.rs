//! # Ports Layer
//!
//! - `inbound`: `MessageDispatchApi`, called by the transport endpoint
//! - `outbound`: `MessageHandler`, implemented by the application

pub mod inbound;
pub mod outbound;
