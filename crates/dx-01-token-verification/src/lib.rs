//! # Token Verification Subsystem (DX-01)
//!
//! Verifies the claims of Dynamic Attribute Tokens (DATs) presented by remote
//! connectors.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): time validity checks, rule chain, errors
//! - **Ports Layer** (`ports/`): verification API, clock, token decoder and source
//! - **Service Layer** (`service.rs`): `TokenVerifier` wiring both together
//!
//! ## Verification Order
//!
//! Null input, outdated, issued time, not before, then custom rules in
//! registration order. The first failure decides the result.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::errors::{ClaimsError, RuleExecutionError};
pub use domain::rules::{
    FnRule, RequiredClaimRule, RuleChain, RuleResult, SubjectAllowListRule, ValidationRule,
};
pub use domain::validity::check_time_validity;
pub use ports::inbound::ClaimsVerificationApi;
pub use ports::outbound::{
    DecodeError, ManualTimeSource, SystemTimeSource, TimeSource, TokenDecoder, TokenSource,
    TokenSourceError,
};
pub use service::{TokenVerifier, TokenVerifierBuilder};
