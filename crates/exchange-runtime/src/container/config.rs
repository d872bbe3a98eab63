//! # Exchange Configuration
//!
//! Unified configuration for the connector runtime.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DX_CONNECTOR_ID` | `connector.connector_id` |
//! | `DX_SENDER_AGENT` | `connector.sender_agent` |
//! | `DX_TOKEN_TTL_SECS` | `connector.token_ttl_secs` |
//! | `DX_SECURITY_PROFILE` | `verifier.required_security_profile` (`none` clears it) |
//! | `DX_ALLOWED_SUBJECTS` | `verifier.allowed_subjects` (comma separated) |
//! | `DX_THROW_ON_REJECTION` | `exchange.rejection_policy` |
//! | `DX_LOG_LEVEL` / `RUST_LOG` | `telemetry.log_level` |
//! | `DX_JSON_LOGS` | `telemetry.json_logs` |

use crate::telemetry::TelemetryConfig;
use dx_02_request_exchange::{ProtocolKind, RejectionPolicy};
use shared_types::{ConnectorIdentity, DEFAULT_MODEL_VERSION};
use thiserror::Error;
use url::Url;

/// Security profile stamped on and required from development tokens.
pub const BASE_SECURITY_PROFILE: &str = "idsc:BASE_SECURITY_PROFILE";

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ExchangeConfig {
    pub connector: ConnectorConfig,
    pub verifier: VerifierConfig,
    pub exchange: ExchangeSettings,
    pub telemetry: TelemetryConfig,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Connector id '{value}' is not an absolute URI: {reason}")]
    InvalidConnectorId { value: String, reason: String },

    #[error("Sender agent '{value}' is not an absolute URI: {reason}")]
    InvalidSenderAgent { value: String, reason: String },

    #[error("Token lifetime must be positive")]
    ZeroTokenLifetime,
}

/// Identity of this connector.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub connector_id: String,
    /// Defaults to the connector id.
    pub sender_agent: Option<String>,
    pub model_version: String,
    /// Lifetime of tokens issued by the development token codec.
    pub token_ttl_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connector_id: "https://connector.localhost/".to_string(),
            sender_agent: None,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            token_ttl_secs: 3_600,
        }
    }
}

/// Custom rules applied after the time checks.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub required_security_profile: Option<String>,
    /// Empty means any subject is accepted.
    pub allowed_subjects: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            required_security_profile: Some(BASE_SECURITY_PROFILE.to_string()),
            allowed_subjects: Vec::new(),
        }
    }
}

/// Outbound request defaults.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub rejection_policy: RejectionPolicy,
    pub enabled_protocols: Vec<ProtocolKind>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            rejection_policy: RejectionPolicy::Propagate,
            enabled_protocols: vec![ProtocolKind::Multipart],
        }
    }
}

impl ExchangeConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup`; malformed values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("DX_CONNECTOR_ID") {
            self.connector.connector_id = id;
        }
        if let Some(agent) = lookup("DX_SENDER_AGENT") {
            self.connector.sender_agent = Some(agent);
        }
        if let Some(ttl) = lookup("DX_TOKEN_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.connector.token_ttl_secs = ttl;
        }
        if let Some(profile) = lookup("DX_SECURITY_PROFILE") {
            self.verifier.required_security_profile = match profile.trim() {
                "" | "none" => None,
                value => Some(value.to_string()),
            };
        }
        if let Some(subjects) = lookup("DX_ALLOWED_SUBJECTS") {
            self.verifier.allowed_subjects = subjects
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(flag) = lookup("DX_THROW_ON_REJECTION") {
            self.exchange.rejection_policy = if parse_flag(&flag) {
                RejectionPolicy::ThrowOnRejection
            } else {
                RejectionPolicy::Propagate
            };
        }
        if let Some(level) = lookup("DX_LOG_LEVEL").or_else(|| lookup("RUST_LOG")) {
            self.telemetry.log_level = level;
        }
        if let Some(flag) = lookup("DX_JSON_LOGS") {
            self.telemetry.json_logs = parse_flag(&flag);
        }
    }

    /// Check the configuration before wiring anything.
    ///
    /// # Errors
    /// `ConfigError` for a connector id or sender agent that is not an
    /// absolute URI, or a zero token lifetime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.identity().map(|_| ())?;
        if self.connector.token_ttl_secs == 0 {
            return Err(ConfigError::ZeroTokenLifetime);
        }
        Ok(())
    }

    /// Header identity described by the connector section.
    pub fn identity(&self) -> Result<ConnectorIdentity, ConfigError> {
        let connector_id = parse_absolute(&self.connector.connector_id).map_err(|reason| {
            ConfigError::InvalidConnectorId {
                value: self.connector.connector_id.clone(),
                reason,
            }
        })?;

        let mut identity = ConnectorIdentity::new(connector_id);
        identity.model_version = self.connector.model_version.clone();

        if let Some(agent) = &self.connector.sender_agent {
            let sender_agent =
                parse_absolute(agent).map_err(|reason| ConfigError::InvalidSenderAgent {
                    value: agent.clone(),
                    reason,
                })?;
            identity = identity.with_sender_agent(sender_agent);
        }
        Ok(identity)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_absolute(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URI has no hierarchical part".to_string());
    }
    Ok(url)
}
