//! # Request Errors
//!
//! One flat taxonomy for everything `execute` can fail with. Collaborator
//! faults keep their own variant so callers can branch on them.

use super::entities::{Operation, ProtocolKind};
use dx_01_token_verification::ClaimsError;
use shared_types::RejectionReason;
use std::fmt;
use thiserror::Error;

/// What was not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    /// The protocol has no registered handler.
    Protocol(ProtocolKind),
    /// The request subject has no template for the operation.
    Operation {
        subject: &'static str,
        operation: Operation,
    },
}

impl fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedKind::Protocol(_) => f.write_str("Not yet implemented Protocol!"),
            UnsupportedKind::Operation { .. } => f.write_str("Unsupported Operation!"),
        }
    }
}

/// Errors from building, sending or classifying a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Required builder fields are unset.
    #[error("Missing required request fields: {}", .missing.join(", "))]
    Precondition { missing: Vec<&'static str> },

    /// Protocol or operation not implemented.
    #[error("{0}")]
    Unsupported(UnsupportedKind),

    /// The remote side rejected the request.
    #[error("Request rejected ({reason}): {}", .message.as_deref().unwrap_or("no description"))]
    Rejection {
        reason: RejectionReason,
        message: Option<String>,
    },

    /// The response payload is not of the expected type.
    #[error("Unexpected payload: expected {expected}, got {actual}")]
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },

    /// Sending failed at the transport level.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The outgoing message could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The response failed schema validation.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// The multipart response could not be split into its parts.
    #[error("Multipart parse error: {0}")]
    MultipartParse(String),

    /// The response is not a message this side knows how to answer with.
    #[error("Unknown response: {0}")]
    UnknownResponse(String),

    /// No DAT could be obtained for the outgoing header.
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// The DAT of the response failed verification.
    #[error("Response claims rejected: {0}")]
    Claims(#[from] ClaimsError),

    /// The template provider could not build the message.
    #[error("Template error: {0}")]
    Template(String),
}

impl RequestError {
    /// Transport faults may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Transport(_))
    }

    /// Faults in how the request was configured, not in the exchange.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            RequestError::Precondition { .. } | RequestError::Unsupported(_)
        )
    }
}
