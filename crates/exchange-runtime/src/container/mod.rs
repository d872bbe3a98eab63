//! # Runtime Container
//!
//! Configuration consumed by the wiring layer.

pub mod config;

pub use config::{
    ConfigError, ConnectorConfig, ExchangeConfig, ExchangeSettings, VerifierConfig,
    BASE_SECURITY_PROFILE,
};
