//! Scheduling seam for the host's periodic callback
//!
//! The engine never sleeps or spawns. It asks a `Scheduler` for a repeating
//! fire every interval and gets back a `TickHandle`; the host calls
//! `TimerEngine::fire(handle)` each time that schedule fires.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Identifies one repeating schedule
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(pub u64);

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick#{}", self.0)
    }
}

/// Host-provided periodic callback primitive
pub trait Scheduler {
    /// Start firing every `interval`
    fn schedule(&mut self, interval: Duration) -> TickHandle;

    /// Stop firing `handle`. Must take effect before returning.
    fn cancel(&mut self, handle: TickHandle);
}

#[derive(Debug, Default)]
struct ManualSchedule {
    next_id: u64,
    active: Vec<(TickHandle, Duration)>,
    cancelled: Vec<TickHandle>,
}

/// Scheduler that only records requests; tests fire handles by hand.
/// Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualSchedule>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live schedules in creation order
    pub fn active(&self) -> Vec<(TickHandle, Duration)> {
        self.inner.lock().active.clone()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// The most recently created live handle
    pub fn current(&self) -> Option<TickHandle> {
        self.inner.lock().active.last().map(|(handle, _)| *handle)
    }

    pub fn cancelled(&self) -> Vec<TickHandle> {
        self.inner.lock().cancelled.clone()
    }

    pub fn is_active(&self, handle: TickHandle) -> bool {
        self.inner.lock().active.iter().any(|(h, _)| *h == handle)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, interval: Duration) -> TickHandle {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let handle = TickHandle(inner.next_id);
        inner.active.push((handle, interval));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.active.iter().position(|(h, _)| *h == handle) {
            inner.active.remove(pos);
            inner.cancelled.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_records() {
        let mut scheduler = ManualScheduler::new();
        let view = scheduler.clone();

        let a = scheduler.schedule(Duration::from_millis(100));
        let b = scheduler.schedule(Duration::from_millis(250));
        assert_ne!(a, b);
        assert_eq!(view.active_count(), 2);
        assert_eq!(view.current(), Some(b));

        scheduler.cancel(a);
        assert!(!view.is_active(a));
        assert!(view.is_active(b));
        assert_eq!(view.cancelled(), vec![a]);

        // Cancelling twice is harmless
        scheduler.cancel(a);
        assert_eq!(view.cancelled(), vec![a]);
        assert_eq!(view.active(), vec![(b, Duration::from_millis(250))]);
    }
}
