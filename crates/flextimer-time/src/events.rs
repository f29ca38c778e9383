//! Lifecycle event bus
//!
//! Synchronous observer list keyed by `EventKind`. Listeners run in
//! registration order; a panicking listener is logged and skipped so the
//! remaining listeners still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use flextimer_core::{EventKind, TimerEvent};
use tracing::error;

/// Boxed event callback
pub type Listener = Box<dyn FnMut(&TimerEvent) + Send>;

/// Returned by `EventBus::on`, used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `kind`
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&TimerEvent) + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe; returns whether the listener was registered
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(l, _)| *l != id);
        listeners.len() != before
    }

    /// Drop every listener for `kind`
    pub fn clear(&mut self, kind: EventKind) {
        self.listeners.remove(&kind);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to its listeners.
    /// Returns how many listeners panicked.
    pub fn emit(&mut self, event: &TimerEvent) -> usize {
        let kind = event.kind();
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return 0;
        };

        let mut failed = 0;
        for (id, listener) in listeners.iter_mut() {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                failed += 1;
                error!(event = %kind, listener = id.0, "event listener panicked");
            }
        }
        failed
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (*kind, listeners.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
