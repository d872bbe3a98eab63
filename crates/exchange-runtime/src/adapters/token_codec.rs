//! # Development Token Codec
//!
//! Issues and reads unsigned DATs whose token value is the JSON claims body.
//! Stands in for a DAPS client in local setups; it performs no signature
//! checks, so it must never face an untrusted network.

use dx_01_token_verification::{
    DecodeError, TimeSource, TokenDecoder, TokenSource, TokenSourceError,
};
use shared_types::{Claims, SecurityToken, JWT_TOKEN_FORMAT};
use tracing::trace;

/// Claim carrying the security profile of the issuing connector.
pub const SECURITY_PROFILE_CLAIM: &str = "securityProfile";

pub struct DevTokenCodec<C: TimeSource> {
    subject: String,
    security_profile: Option<String>,
    ttl_secs: u64,
    clock: C,
}

impl<C: TimeSource> DevTokenCodec<C> {
    pub fn new(subject: impl Into<String>, ttl_secs: u64, clock: C) -> Self {
        Self {
            subject: subject.into(),
            security_profile: None,
            ttl_secs,
            clock,
        }
    }

    #[must_use]
    pub fn with_security_profile(mut self, profile: impl Into<String>) -> Self {
        self.security_profile = Some(profile.into());
        self
    }

    /// Claims a token issued now would carry.
    pub fn issue_claims(&self) -> Claims {
        let now = self.clock.now();
        let claims = Claims::window(now, now, now.saturating_add(self.ttl_secs))
            .with_subject(self.subject.clone());
        match &self.security_profile {
            Some(profile) => claims.with_claim(SECURITY_PROFILE_CLAIM, profile.clone()),
            None => claims,
        }
    }
}

impl<C: TimeSource> TokenSource for DevTokenCodec<C> {
    fn current_token(&self) -> Result<SecurityToken, TokenSourceError> {
        let claims = self.issue_claims();
        let value =
            serde_json::to_string(&claims).map_err(|e| TokenSourceError(e.to_string()))?;
        trace!(subject = %self.subject, "Issued development DAT");
        Ok(SecurityToken::jwt(value))
    }
}

impl<C: TimeSource> TokenDecoder for DevTokenCodec<C> {
    fn decode(&self, token: &SecurityToken) -> Result<Claims, DecodeError> {
        if token.token_format != JWT_TOKEN_FORMAT {
            return Err(DecodeError::UnsupportedFormat(token.token_format.clone()));
        }
        serde_json::from_str(&token.token_value).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}
