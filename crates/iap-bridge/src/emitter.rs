//! # Event Emitter
//!
//! Delivers terminal events to the single registered listener. Emitting with
//! no listener registered is a silent no-op; callers that need a guarantee
//! check [`EventEmitter::has_listener`] before starting work.

use iap_core::{dispatch_event, PurchaseEvent, PurchaseEventListener};
use std::sync::Arc;
use tracing::debug;

/// Holds at most one listener and dispatches events to it.
#[derive(Default)]
pub struct EventEmitter {
    listener: Option<Arc<dyn PurchaseEventListener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: Arc<dyn PurchaseEventListener>) {
        self.listener = Some(listener);
    }

    pub fn remove_listener(&mut self) {
        self.listener = None;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Deliver one event. Dropped silently when no listener is registered.
    pub fn emit(&self, event: PurchaseEvent) {
        match &self.listener {
            Some(listener) => dispatch_event(listener.as_ref(), &event),
            None => debug!(event = event.name(), "no listener registered, dropping event"),
        }
    }
}
