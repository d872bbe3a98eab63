//! # Handler Registry
//!
//! Maps each message kind to at most one handler.

use crate::ports::outbound::MessageHandler;
use parking_lot::RwLock;
use shared_types::MessageKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<MessageKind, Arc<dyn MessageHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any earlier one.
    pub fn register(&self, kind: MessageKind, handler: Arc<dyn MessageHandler>) {
        if self.handlers.write().insert(kind, handler).is_some() {
            warn!(kind = %kind, "Replaced existing message handler");
        } else {
            info!(kind = %kind, "Registered message handler");
        }
    }

    pub fn get(&self, kind: MessageKind) -> Option<Arc<dyn MessageHandler>> {
        self.handlers.read().get(&kind).cloned()
    }

    pub fn contains(&self, kind: MessageKind) -> bool {
        self.handlers.read().contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}
