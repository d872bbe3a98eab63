//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies the verifier needs from its environment, plus the source of
//! this connector's own DAT.

use shared_types::{Claims, SecurityToken, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

// =============================================================================
// TIME SOURCE
// =============================================================================

/// Source of the current time in Unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable time source for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

// =============================================================================
// TOKEN DECODER
// =============================================================================

/// Error from decoding a security token into claims.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The token format is not handled by this decoder.
    #[error("Unsupported token format: {0}")]
    UnsupportedFormat(String),

    /// The token value could not be parsed.
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Turns the security token carried in a message header into claims.
///
/// Signature validation against the DAPS key set belongs to the decoder.
pub trait TokenDecoder: Send + Sync {
    /// # Errors
    /// `DecodeError` when the token cannot be turned into claims.
    fn decode(&self, token: &SecurityToken) -> Result<Claims, DecodeError>;
}

// =============================================================================
// TOKEN SOURCE
// =============================================================================

/// Failure to obtain the connector's own DAT.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TokenSourceError(pub String);

/// Supplies the DAT stamped on outgoing headers and answers.
///
/// Fetching the token from the DAPS is the implementor's concern.
pub trait TokenSource: Send + Sync {
    /// # Errors
    /// `TokenSourceError` when no token is available.
    fn current_token(&self) -> Result<SecurityToken, TokenSourceError>;
}

impl<S: TokenSource + ?Sized> TokenSource for std::sync::Arc<S> {
    fn current_token(&self) -> Result<SecurityToken, TokenSourceError> {
        (**self).current_token()
    }
}
