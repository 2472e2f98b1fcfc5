//! Lifecycle listener registry

use super::{EventKind, LifecycleEvent};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Receiver of broker lifecycle events
///
/// Called inline on the broker's event path, so implementations must not block.
pub trait LifecycleListener: Send + Sync {
    /// Listener name for logging
    fn id(&self) -> &str;

    /// Event kinds this listener wants
    fn provides(&self) -> &[EventKind];

    /// Handle one event
    fn on_event(&self, event: &LifecycleEvent);
}

/// Registry of lifecycle listeners, keyed by event kind
#[derive(Default)]
pub struct HookRegistry {
    listeners: RwLock<HashMap<EventKind, Vec<Arc<dyn LifecycleListener>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every kind it provides
    pub fn register(&self, listener: Arc<dyn LifecycleListener>) {
        let mut listeners = self.listeners.write();
        for kind in listener.provides() {
            listeners.entry(*kind).or_default().push(listener.clone());
        }
        debug!(listener = %listener.id(), kinds = ?listener.provides(), "Registered lifecycle listener");
    }

    /// Deliver an event to its listeners in registration order.
    ///
    /// Returns the number of listeners that received it.
    pub fn dispatch(&self, event: &LifecycleEvent) -> usize {
        // Snapshot so listeners run without the registry lock held
        let targets = match self.listeners.read().get(&event.kind()) {
            Some(targets) => targets.clone(),
            None => return 0,
        };

        for listener in &targets {
            listener.on_event(event);
        }
        targets.len()
    }

    /// Number of listeners registered for a kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }
}
