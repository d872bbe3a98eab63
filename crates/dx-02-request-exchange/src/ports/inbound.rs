//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::MessageContainer;
use crate::domain::errors::RequestError;
use async_trait::async_trait;
use url::Url;

/// A fully configured request that can be sent to a target endpoint.
///
/// `execute` suspends the caller until the transport answers or fails. It may
/// be called more than once; each call re-runs the same frozen configuration.
#[async_trait]
pub trait ExecutableRequest<T>: Send + Sync {
    /// # Errors
    /// Exactly one `RequestError` kind describing why the exchange failed.
    async fn execute(&self, target: &Url) -> Result<MessageContainer<T>, RequestError>;
}
