//! # Token Verification Service
//!
//! Application service implementing `ClaimsVerificationApi`.
//!
//! ## Architecture
//!
//! - Implements the inbound port (`ClaimsVerificationApi`)
//! - Reads the clock through the outbound `TimeSource` port
//! - Delegates the time checks and the rule chain to the domain layer
//!
//! ## Rule Registration
//!
//! Rules are injected at construction through `TokenVerifierBuilder`.
//! `add_rule` needs `&mut self`, so a verifier shared behind `Arc` can no
//! longer change its chain while verification traffic is running.

use crate::domain::errors::ClaimsError;
use crate::domain::rules::{RuleChain, ValidationRule};
use crate::domain::validity::check_time_validity;
use crate::ports::inbound::ClaimsVerificationApi;
use crate::ports::outbound::{SystemTimeSource, TimeSource};
use shared_types::Claims;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Verifies DAT claims against time validity and an ordered rule chain.
pub struct TokenVerifier<C: TimeSource = SystemTimeSource> {
    time_source: C,
    rules: RuleChain,
}

impl TokenVerifier<SystemTimeSource> {
    /// Verifier on the wall clock with an empty rule chain.
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for TokenVerifier<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TimeSource> TokenVerifier<C> {
    pub fn with_time_source(time_source: C) -> Self {
        Self {
            time_source,
            rules: RuleChain::new(),
        }
    }

    /// Start building a verifier with an injected rule list.
    pub fn builder(time_source: C) -> TokenVerifierBuilder<C> {
        TokenVerifierBuilder {
            time_source,
            rules: RuleChain::new(),
        }
    }

    /// Append a custom rule to the end of the chain.
    pub fn add_rule(&mut self, rule: impl ValidationRule + 'static) {
        self.add_shared_rule(Arc::new(rule));
    }

    /// Append a rule that is also held elsewhere.
    pub fn add_shared_rule(&mut self, rule: Arc<dyn ValidationRule>) {
        debug!(rule = rule.name(), position = self.rules.len(), "Registering custom rule");
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }
}

impl<C: TimeSource> ClaimsVerificationApi for TokenVerifier<C> {
    fn verify(&self, claims: Option<&Claims>) -> Result<bool, ClaimsError> {
        let Some(claims) = claims else {
            warn!("Could not verify claims, input was null");
            return Err(ClaimsError::NullInput);
        };

        let now = self.time_source.now();
        if let Err(err) = check_time_validity(claims, now) {
            warn!(
                subject = claims.subject.as_deref().unwrap_or("-"),
                now,
                error = %err,
                "Token time validity check failed"
            );
            return Err(err);
        }

        if !self.rules.is_empty() {
            debug!(rules = self.rules.len(), "Checking custom rules");
            if let Err(err) = self.rules.evaluate(claims) {
                match &err {
                    ClaimsError::RuleExecution { rule, message } => {
                        error!(rule = %rule, message = %message, "Custom rule threw while checking claims");
                    }
                    other => warn!(error = %other, "Custom rule rejected claims"),
                }
                return Err(err);
            }
        }

        info!(
            subject = claims.subject.as_deref().unwrap_or("-"),
            "Claims verified successfully"
        );
        Ok(true)
    }

    fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Builder collecting rules in registration order.
#[must_use]
pub struct TokenVerifierBuilder<C: TimeSource> {
    time_source: C,
    rules: RuleChain,
}

impl<C: TimeSource> TokenVerifierBuilder<C> {
    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn with_shared_rule(mut self, rule: Arc<dyn ValidationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ValidationRule>>,
    {
        for rule in rules {
            self.rules.push(rule);
        }
        self
    }

    pub fn build(self) -> TokenVerifier<C> {
        TokenVerifier {
            time_source: self.time_source,
            rules: self.rules,
        }
    }
}
