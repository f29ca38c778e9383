//! Tokio-backed scheduling and clock

use std::collections::HashMap;
use std::time::Duration;

use flextimer_core::MAX_INTERVAL_MS;
use flextimer_time::{epoch_millis, Clock, Scheduler, TickHandle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Shortest period handed to `tokio::time::interval`
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Longest period handed to `tokio::time::interval`
const MAX_PERIOD: Duration = Duration::from_millis(MAX_INTERVAL_MS as u64);

/// Receives the handle of every schedule that fired
pub type FireReceiver = mpsc::UnboundedReceiver<TickHandle>;

/// One interval task per handle, forwarding fires over a channel.
///
/// Must be used from within a tokio runtime. Cancelling aborts the task, but
/// a fire already sitting in the channel is still delivered; the engine
/// rejects it as stale.
#[derive(Debug)]
pub struct TokioScheduler {
    next_id: u64,
    tasks: HashMap<TickHandle, JoinHandle<()>>,
    fired: mpsc::UnboundedSender<TickHandle>,
}

impl TokioScheduler {
    pub fn new() -> (Self, FireReceiver) {
        let (fired, rx) = mpsc::unbounded_channel();
        let scheduler = TokioScheduler {
            next_id: 0,
            tasks: HashMap::new(),
            fired,
        };
        (scheduler, rx)
    }

    /// Number of live interval tasks
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, interval: Duration) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        let period = interval.clamp(MIN_PERIOD, MAX_PERIOD);
        let first = Instant::now() + period;
        let fired = self.fired.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if fired.send(handle).is_err() {
                    break; // Driver dropped
                }
            }
        });

        debug!(?handle, ?period, "schedule armed");
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
            debug!(?handle, "schedule cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Epoch clock that advances with `tokio::time::Instant`, so it stays in
/// step with the scheduler when tokio time is paused or advanced.
#[derive(Clone, Debug)]
pub struct TokioClock {
    base: f64,
    reference: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(epoch_millis())
    }

    /// Read `base` epoch milliseconds right now
    pub fn starting_at(base: f64) -> Self {
        TokioClock {
            base,
            reference: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> f64 {
        self.base + self.reference.elapsed().as_secs_f64() * 1_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_every_interval() {
        let (mut scheduler, mut fires) = TokioScheduler::new();
        let clock = TokioClock::starting_at(0.0);

        let handle = scheduler.schedule(Duration::from_millis(250));
        for expected in [250.0, 500.0, 750.0] {
            assert_eq!(fires.recv().await, Some(handle));
            assert_eq!(clock.now(), expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_fires() {
        let (mut scheduler, mut fires) = TokioScheduler::new();

        let handle = scheduler.schedule(Duration::from_millis(100));
        assert_eq!(fires.recv().await, Some(handle));

        scheduler.cancel(handle);
        assert_eq!(scheduler.active_count(), 0);
        sleep(Duration::from_secs(1)).await;
        assert!(fires.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handles_are_distinct() {
        let (mut scheduler, mut fires) = TokioScheduler::new();

        let slow = scheduler.schedule(Duration::from_millis(300));
        let fast = scheduler.schedule(Duration::from_millis(200));
        assert_ne!(slow, fast);
        assert_eq!(scheduler.active_count(), 2);

        assert_eq!(fires.recv().await, Some(fast));
        assert_eq!(fires.recv().await, Some(slow));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_is_clamped() {
        let (mut scheduler, mut fires) = TokioScheduler::new();

        scheduler.schedule(Duration::MAX);
        assert_eq!(scheduler.active_count(), 1);
        sleep(Duration::from_secs(3_600)).await;
        assert!(fires.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_tasks() {
        let (mut scheduler, mut fires) = TokioScheduler::new();
        scheduler.schedule(Duration::from_millis(100));
        drop(scheduler);

        // Every sender is gone once the aborted task is torn down
        assert_eq!(fires.recv().await, None);
    }
}
