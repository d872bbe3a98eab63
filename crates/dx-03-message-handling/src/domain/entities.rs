//! Handler outcomes.

use shared_types::{MessageEnvelope, RejectionReason};
use thiserror::Error;

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageResponse {
    /// A complete answer envelope.
    Body(MessageEnvelope),
    /// A structured refusal, sent as a `RejectionMessage`.
    Error {
        reason: RejectionReason,
        message: String,
    },
    /// Processed, nothing to return beyond an acknowledgement.
    NoContent,
}

impl MessageResponse {
    pub fn error(reason: RejectionReason, message: impl Into<String>) -> Self {
        MessageResponse::Error {
            reason,
            message: message.into(),
        }
    }
}

/// Failure raised while handling a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The message content is not acceptable.
    #[error("Bad parameters: {0}")]
    BadParameters(String),

    /// The referenced resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anything else that went wrong on this side.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Rejection reason reported to the sender.
    pub fn rejection_reason(&self) -> RejectionReason {
        match self {
            HandlerError::BadParameters(_) => RejectionReason::BadParameters,
            HandlerError::NotFound(_) => RejectionReason::NotFound,
            HandlerError::Internal(_) => RejectionReason::InternalRecipientError,
        }
    }
}
