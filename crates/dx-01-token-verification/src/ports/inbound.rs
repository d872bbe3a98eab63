//! # Inbound Ports (Driving Ports / API)
//!
//! The claims verification API used by inbound dispatch and by request
//! exchange when checking a remote connector's DAT.

use crate::domain::errors::ClaimsError;
use shared_types::Claims;

/// Primary Claims Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`) and must not mutate
/// shared state during `verify`.
pub trait ClaimsVerificationApi: Send + Sync {
    /// Verify decoded DAT claims.
    ///
    /// Returns `Ok(true)` only when the time checks and every custom rule
    /// pass. `Ok(false)` is never produced; failures are always errors.
    ///
    /// # Errors
    /// * `ClaimsError::NullInput` - no claims were presented
    /// * `ClaimsError::Outdated`, `IssuedTimeInvalid`, `NotBeforeInvalid` - time checks
    /// * `ClaimsError::MissingClaim` - a time claim is absent
    /// * `ClaimsError::CustomRuleFailed` / `RuleExecution` - custom rules
    fn verify(&self, claims: Option<&Claims>) -> Result<bool, ClaimsError>;

    /// Number of registered custom rules.
    fn rule_count(&self) -> usize;
}
