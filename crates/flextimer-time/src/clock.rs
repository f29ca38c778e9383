//! Clock sources for the timing engine

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Current `SystemTime` as epoch milliseconds
pub fn epoch_millis() -> f64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs_f64() * 1_000.0,
        Err(before) => -(before.duration().as_secs_f64() * 1_000.0),
    }
}

/// Source of "now" for the engine, in epoch milliseconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// System clock - epoch-based, monotonic
/// Reads the wall clock once, then advances by `Instant` so readings never
/// jump backwards when the wall clock is adjusted.
#[derive(Clone, Debug)]
pub struct SystemClock {
    /// Epoch milliseconds at `reference`
    base: f64,
    /// Monotonic OS clock reference
    reference: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            base: epoch_millis(),
            reference: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.base + self.reference.elapsed().as_secs_f64() * 1_000.0
    }
}

/// Manually driven clock for tests and deterministic replays.
/// Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: f64) {
        *self.now.lock() = now;
    }

    /// Move the clock forward by `ms` and return the new reading
    pub fn advance(&self, ms: f64) -> f64 {
        let mut now = self.now.lock();
        *now += ms;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();

        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = clock.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= 10.0);
    }

    #[test]
    fn test_system_clock_tracks_epoch() {
        let clock = SystemClock::new();
        // Same time base as the wall clock, within a generous margin
        assert!((clock.now() - epoch_millis()).abs() < 1_000.0);
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(1_000.0);
        let handle = clock.clone();

        handle.advance(250.0);
        assert_eq!(clock.now(), 1_250.0);

        clock.set(5.0);
        assert_eq!(handle.now(), 5.0);
    }
}
