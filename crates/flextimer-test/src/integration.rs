//! End-to-end runs through the tokio driver
//!
//! A recorded run builds an engine from a `TimerConfig`, drives it on a
//! `TimerDriver` with a `TokioClock`, and captures every event. Under a
//! paused tokio runtime the whole run is deterministic.

use std::sync::Arc;
use std::time::Duration;

use flextimer_core::{EventKind, TickUpdate, TimerConfig, TimerEvent};
use flextimer_runtime::{RuntimeResult, TimerDriver, TokioClock};
use flextimer_time::{TextDisplay, TickStats, TimerBuilder, TimerState};
use parking_lot::Mutex;
use tokio::time::sleep;

/// Everything observed during a driven run
#[derive(Clone, Debug)]
pub struct RecordedRun {
    pub events: Vec<EventKind>,
    pub ticks: Vec<TickUpdate>,
    /// Display text when the run ended
    pub final_text: String,
    pub stats: TickStats,
    pub state: TimerState,
}

impl RecordedRun {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|k| **k == kind).count()
    }

    pub fn formatted(&self) -> Vec<&str> {
        self.ticks.iter().map(|t| t.formatted.as_str()).collect()
    }
}

/// Drive `config` from epoch `start` until a non-looping countdown
/// completes or `limit` of tokio time passes.
pub async fn record_run(config: TimerConfig, start: f64, limit: Duration) -> RuntimeResult<RecordedRun> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let ticks = Arc::new(Mutex::new(Vec::new()));

    let mut builder = TimerBuilder::new(config);
    for kind in EventKind::ALL {
        let sink = events.clone();
        builder = builder.on(kind, move |event: &TimerEvent| sink.lock().push(event.kind()));
    }
    let sink = ticks.clone();
    builder = builder.on_tick(move |update| sink.lock().push(update.clone()));

    let display = TextDisplay::new();
    let (driver, control) = TimerDriver::new(builder, display.clone(), TokioClock::starting_at(start))?;

    let stopper = control.clone();
    let watchdog = tokio::spawn(async move {
        sleep(limit).await;
        // The driver may already be gone
        let _ = stopper.shutdown();
    });

    let engine = driver.run_until_complete().await;
    watchdog.abort();

    let events = events.lock().clone();
    let ticks = ticks.lock().clone();
    Ok(RecordedRun {
        events,
        ticks,
        final_text: display.text(),
        stats: engine.stats().clone(),
        state: engine.state(),
    })
}
