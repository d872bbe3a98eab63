//! # Custom Validation Rules
//!
//! Pluggable checks run after the built-in time validity checks.
//!
//! ## Ordering
//!
//! A `RuleChain` evaluates its rules strictly in registration order and stops
//! at the first rule that fails or faults. Later rules are guaranteed not to
//! run, so side effects of rules observe that order too.

use super::errors::{ClaimsError, RuleExecutionError};
use serde_json::Value;
use shared_types::Claims;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// RULE CONTRACT
// =============================================================================

/// Verdict of one rule invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    success: bool,
    message: String,
}

impl RuleResult {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
        }
    }

    /// Passing verdict with an empty message.
    pub fn ok() -> Self {
        Self::new(true, String::new())
    }

    /// Failing verdict carrying the reason.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single custom check against DAT claims.
///
/// Rules may hold their own configuration but must not depend on state from a
/// previous verification.
pub trait ValidationRule: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Evaluate the rule.
    ///
    /// # Errors
    /// `RuleExecutionError` if the rule cannot reach a verdict.
    fn check_rule(&self, claims: &Claims) -> Result<RuleResult, RuleExecutionError>;
}

// =============================================================================
// RULE CHAIN
// =============================================================================

/// Ordered sequence of custom rules.
#[derive(Clone, Default)]
pub struct RuleChain {
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; it runs after every rule registered before it.
    pub fn push(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run the rules in order, stopping at the first failure.
    ///
    /// # Errors
    /// - `ClaimsError::CustomRuleFailed` for a negative verdict
    /// - `ClaimsError::RuleExecution` when a rule faults
    pub fn evaluate(&self, claims: &Claims) -> Result<(), ClaimsError> {
        for rule in &self.rules {
            match rule.check_rule(claims) {
                Ok(result) if result.is_success() => continue,
                Ok(result) => {
                    return Err(ClaimsError::CustomRuleFailed {
                        rule: rule.name().to_string(),
                        message: result.message,
                    })
                }
                Err(fault) => {
                    return Err(ClaimsError::RuleExecution {
                        rule: rule.name().to_string(),
                        message: fault.message,
                    })
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// =============================================================================
// STOCK RULES
// =============================================================================

/// Requires a custom claim to be present, optionally with a fixed value.
#[derive(Debug, Clone)]
pub struct RequiredClaimRule {
    claim: String,
    expected: Option<Value>,
}

impl RequiredClaimRule {
    pub fn present(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            expected: None,
        }
    }

    pub fn equals(claim: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            claim: claim.into(),
            expected: Some(expected.into()),
        }
    }
}

impl ValidationRule for RequiredClaimRule {
    fn name(&self) -> &str {
        "required-claim"
    }

    fn check_rule(&self, claims: &Claims) -> Result<RuleResult, RuleExecutionError> {
        let Some(actual) = claims.claim(&self.claim) else {
            return Ok(RuleResult::fail(format!(
                "Required claim '{}' is missing",
                self.claim
            )));
        };
        match &self.expected {
            Some(expected) if expected != actual => Ok(RuleResult::fail(format!(
                "Claim '{}' is {}, expected {}",
                self.claim, actual, expected
            ))),
            _ => Ok(RuleResult::ok()),
        }
    }
}

/// Only admits tokens issued to one of the listed subjects.
#[derive(Debug, Clone)]
pub struct SubjectAllowListRule {
    allowed: HashSet<String>,
}

impl SubjectAllowListRule {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl ValidationRule for SubjectAllowListRule {
    fn name(&self) -> &str {
        "subject-allow-list"
    }

    fn check_rule(&self, claims: &Claims) -> Result<RuleResult, RuleExecutionError> {
        match claims.subject.as_deref() {
            None => Ok(RuleResult::fail("Token has no subject")),
            Some(subject) if self.allowed.contains(subject) => Ok(RuleResult::ok()),
            Some(subject) => Ok(RuleResult::fail(format!(
                "Subject '{}' is not allowed",
                subject
            ))),
        }
    }
}

/// Adapts a closure into a rule.
pub struct FnRule<F> {
    name: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Claims) -> Result<RuleResult, RuleExecutionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<F> ValidationRule for FnRule<F>
where
    F: Fn(&Claims) -> Result<RuleResult, RuleExecutionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check_rule(&self, claims: &Claims) -> Result<RuleResult, RuleExecutionError> {
        (self.check)(claims)
    }
}
