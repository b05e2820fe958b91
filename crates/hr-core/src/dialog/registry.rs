//! Dialog registry
//!
//! Maps stage identifiers to their handlers. Built once at startup and
//! read-only afterward, so it needs no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dialog::DialogHandler;
use crate::session::DialogKind;

/// Registry of dialog handlers indexed by kind
#[derive(Default)]
pub struct DialogRegistry {
    handlers: HashMap<DialogKind, Arc<dyn DialogHandler>>,
}

impl DialogRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler
    ///
    /// A handler already registered for the same kind is replaced.
    pub fn register(&mut self, handler: Arc<dyn DialogHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Get the handler for a dialog kind
    pub fn get(&self, kind: DialogKind) -> Option<Arc<dyn DialogHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: DialogKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
