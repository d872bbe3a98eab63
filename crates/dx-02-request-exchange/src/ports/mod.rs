//! # Ports Layer
//!
//! - `inbound`: what callers drive (`ExecutableRequest`)
//! - `outbound`: template provider, message service and protocol handlers

pub mod inbound;
pub mod outbound;
