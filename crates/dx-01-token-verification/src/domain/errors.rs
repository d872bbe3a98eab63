//! # Claims Errors
//!
//! Error types for DAT claims verification.

use shared_types::Timestamp;
use thiserror::Error;

/// Errors that can occur while verifying DAT claims.
///
/// Every failure of `verify` is exactly one of these kinds. Faults raised by
/// custom rules are wrapped as `RuleExecution` and never escape raw.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimsError {
    /// No claims were presented at all.
    #[error("Could not verify claims, input was null!")]
    NullInput,

    /// The token expired at or before the current time.
    #[error("The token is outdated.")]
    Outdated { expiration: Timestamp, now: Timestamp },

    /// `iat` lies after `exp` or in the future.
    #[error("The token's issued time (iat) is invalid")]
    IssuedTimeInvalid {
        issued_at: Timestamp,
        expiration: Timestamp,
        now: Timestamp,
    },

    /// The token is not valid yet.
    #[error("The token's not before time is invalid")]
    NotBeforeInvalid { not_before: Timestamp, now: Timestamp },

    /// A time claim needed by the checks is absent.
    #[error("Could not verify claims of the DAT, missing claim: {claim}")]
    MissingClaim { claim: &'static str },

    /// A custom rule rejected the token.
    #[error("Custom Rule failed! Message: {message}")]
    CustomRuleFailed { rule: String, message: String },

    /// A custom rule could not be evaluated.
    #[error("Custom Rule threw Exception! Message: {message}")]
    RuleExecution { rule: String, message: String },
}

impl ClaimsError {
    /// Whether the failure came from the built-in time validity checks.
    pub fn is_time_validity(&self) -> bool {
        matches!(
            self,
            ClaimsError::Outdated { .. }
                | ClaimsError::IssuedTimeInvalid { .. }
                | ClaimsError::NotBeforeInvalid { .. }
        )
    }
}

/// Fault raised by a custom rule while evaluating claims.
///
/// Distinct from a negative `RuleResult`: the rule could not reach a verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleExecutionError {
    pub message: String,
}

impl RuleExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
