//! # Response Classification
//!
//! Turns the envelope returned by the transport into the typed outcome of a
//! request.
//!
//! ## Order
//!
//! 1. Rejection with `ThrowOnRejection` fails with `RequestError::Rejection`
//! 2. Rejection with `Propagate` returns a container exposing the rejection
//! 3. A payload that does not convert to `T` fails with `UnexpectedPayload`
//! 4. Anything else is a success

use super::entities::{MessageContainer, RejectionPolicy, ResponseMeta};
use super::errors::RequestError;
use super::payload::ExpectedPayload;
use shared_types::MessageEnvelope;

/// Classify a response envelope under the given rejection policy.
///
/// # Errors
/// `RequestError::Rejection` or `RequestError::UnexpectedPayload`.
pub fn classify<T: ExpectedPayload>(
    response: MessageEnvelope,
    policy: RejectionPolicy,
) -> Result<MessageContainer<T>, RequestError> {
    let meta = ResponseMeta {
        header: response.header().clone(),
        kind: response.kind(),
        rejection: response.rejection(),
    };

    if let Some(rejection) = &meta.rejection {
        if policy == RejectionPolicy::ThrowOnRejection {
            return Err(RequestError::Rejection {
                reason: rejection.reason,
                message: rejection.message.clone(),
            });
        }
        // Rejection text is kept only when it converts to T.
        let payload = response.payload().and_then(|raw| T::from_raw(raw).ok());
        return Ok(MessageContainer::new(payload, meta));
    }

    let payload = match response.payload() {
        None => None,
        Some(raw) => match T::from_raw(raw) {
            Ok(payload) => Some(payload),
            Err(raw) => {
                return Err(RequestError::UnexpectedPayload {
                    expected: T::type_name(),
                    actual: raw.type_name(),
                })
            }
        },
    };
    Ok(MessageContainer::new(payload, meta))
}
