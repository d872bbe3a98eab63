//! # Protocol Capability Table
//!
//! Maps each `ProtocolKind` to a present or absent handler. Whether a protocol
//! can be used is known once the table is built, before any request runs.

use crate::domain::entities::ProtocolKind;
use crate::domain::errors::{RequestError, UnsupportedKind};
use crate::ports::outbound::ProtocolHandler;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ProtocolTable {
    handlers: HashMap<ProtocolKind, Arc<dyn ProtocolHandler>>,
}

impl ProtocolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the protocol it reports. Replaces any earlier
    /// handler for that protocol.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ProtocolHandler>) -> Self {
        self.handlers.insert(handler.protocol(), handler);
        self
    }

    pub fn supports(&self, protocol: ProtocolKind) -> bool {
        self.handlers.contains_key(&protocol)
    }

    /// Handler for `protocol`.
    ///
    /// # Errors
    /// `RequestError::Unsupported` when no handler is registered.
    pub fn handler(&self, protocol: ProtocolKind) -> Result<Arc<dyn ProtocolHandler>, RequestError> {
        self.handlers
            .get(&protocol)
            .cloned()
            .ok_or(RequestError::Unsupported(UnsupportedKind::Protocol(protocol)))
    }

    /// Supported protocols in a stable order.
    pub fn supported(&self) -> Vec<ProtocolKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for ProtocolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolTable")
            .field("supported", &self.supported())
            .finish()
    }
}
