//! # Adapters
//!
//! - `multipart`: protocol handler on top of the `MessageService` port
//! - `templates`: header templates from the connector identity
//! - `verifying`: DAT check on answers, wrapping any `MessageService`

pub mod multipart;
pub mod templates;
pub mod verifying;

pub use multipart::MultipartProtocol;
pub use templates::IdentityTemplateProvider;
pub use verifying::VerifyingMessageService;
