//! # Domain Layer

pub mod entities;

pub use entities::{HandlerError, MessageResponse};
