//! # Adapter Implementations
//!
//! Concrete implementations of the driven ports the subsystems declare:
//!
//! - `token_codec`: `TokenSource` (dx-02) and `TokenDecoder` (dx-01)
//! - `wire` / `loopback`: `MessageService` (dx-02) over the multipart frame
//! - `directory`: `MessageHandler` (dx-03) for connector lifecycle messages

pub mod directory;
pub mod loopback;
pub mod token_codec;
pub mod wire;

pub use directory::{ConnectorDirectory, ConnectorStatus, DirectoryHandler};
pub use loopback::LoopbackMessageService;
pub use token_codec::{DevTokenCodec, SECURITY_PROFILE_CLAIM};
pub use wire::{decode, encode, MultipartFrame};
