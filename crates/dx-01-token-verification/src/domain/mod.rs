//! # Domain Layer
//!
//! Pure verification logic: time validity checks, custom rules and errors.

pub mod errors;
pub mod rules;
pub mod validity;

pub use errors::{ClaimsError, RuleExecutionError};
pub use rules::{
    FnRule, RequiredClaimRule, RuleChain, RuleResult, SubjectAllowListRule, ValidationRule,
};
pub use validity::check_time_validity;
