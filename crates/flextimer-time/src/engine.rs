//! Timer Engine - lifecycle state machine and per-mode arithmetic
//!
//! The engine is a plain owned value. Every operation takes `&mut self` and
//! runs to completion; the host scheduler calls `fire` with the handle it was
//! given, and everything time-dependent reads the injected `Clock`, so tests
//! can drive it with synthetic timestamps.

use flextimer_core::{
    format_reading, ClockReading, EventKind, Reading, TickUpdate, TimeBreakdown, TimerConfig,
    TimerError, TimerEvent, TimerMode, TimerResult, TimerSettings,
};
use tracing::{debug, warn};

use crate::{Clock, DisplaySink, DriftCorrector, EventBus, ListenerId, Scheduler, TickHandle};

/// Lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerState {
    /// Built, never started (or reset)
    Idle,
    /// Ticking; exactly one tick handle is live
    Running,
    /// Ticking suspended, elapsed time frozen
    Paused,
    /// Stopped or completed; can be started again
    Stopped,
}

/// Per-engine tick diagnostics
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub last_drift: f64,
    pub max_drift: f64,
    /// Sum of the corrector's per-tick contributions
    pub corrected_elapsed: f64,
    pub completions: u64,
    /// Fires that arrived for a cancelled handle
    pub stale_fires: u64,
}

/// Collects lifecycle hooks before the engine exists, so hooks also see
/// the `start` emitted by auto-start.
#[derive(Debug)]
pub struct TimerBuilder {
    config: TimerConfig,
    events: EventBus,
}

impl TimerBuilder {
    pub fn new(config: TimerConfig) -> Self {
        TimerBuilder {
            config,
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn on<F>(mut self, kind: EventKind, listener: F) -> Self
    where
        F: FnMut(&TimerEvent) + Send + 'static,
    {
        self.events.on(kind, listener);
        self
    }

    pub fn on_start<F: FnMut() + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Start, move |_| hook())
    }

    pub fn on_pause<F: FnMut() + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Pause, move |_| hook())
    }

    pub fn on_resume<F: FnMut() + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Resume, move |_| hook())
    }

    pub fn on_stop<F: FnMut() + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Stop, move |_| hook())
    }

    pub fn on_complete<F: FnMut() + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Complete, move |_| hook())
    }

    pub fn on_tick<F: FnMut(&TickUpdate) + Send + 'static>(self, mut hook: F) -> Self {
        self.on(EventKind::Tick, move |event| {
            if let Some(update) = event.as_tick() {
                hook(update);
            }
        })
    }

    /// Validate the configuration, render the initial reading and, when
    /// `auto_start` is set, start ticking.
    pub fn build<C, S, D>(self, display: D, clock: C, scheduler: S) -> TimerResult<TimerEngine<C, S, D>>
    where
        C: Clock,
        S: Scheduler,
        D: DisplaySink,
    {
        if !display.is_attached() {
            return Err(TimerError::InvalidTarget("display is not attached".into()));
        }
        let settings = self.config.resolve(clock.now())?;

        let mut engine = TimerEngine {
            mode: settings.mode,
            state: TimerState::Idle,
            start_time: settings.from,
            elapsed: 0.0,
            drift: DriftCorrector::new(settings.interval),
            handle: None,
            settings,
            clock,
            scheduler,
            display,
            events: self.events,
            stats: TickStats::default(),
        };

        let now = engine.clock.now();
        engine.render_at(now, 0.0);
        if engine.settings.auto_start {
            engine.start();
        }
        Ok(engine)
    }
}

/// Timer Engine - owns state, mode arithmetic and the tick handle
pub struct TimerEngine<C: Clock, S: Scheduler, D: DisplaySink> {
    settings: TimerSettings,
    /// Effective mode, after the countdown fallback
    mode: TimerMode,
    state: TimerState,
    /// Run-clock anchor (epoch ms)
    start_time: f64,
    /// Accumulated run time, authoritative while not running
    elapsed: f64,
    drift: DriftCorrector,
    /// INVARIANT: `Some` exactly while `state == Running`
    handle: Option<TickHandle>,
    clock: C,
    scheduler: S,
    display: D,
    events: EventBus,
    stats: TickStats,
}

impl<C: Clock, S: Scheduler, D: DisplaySink> TimerEngine<C, S, D> {
    /// Build an engine without hooks
    pub fn new(display: D, config: TimerConfig, clock: C, scheduler: S) -> TimerResult<Self> {
        TimerBuilder::new(config).build(display, clock, scheduler)
    }

    pub fn builder(config: TimerConfig) -> TimerBuilder {
        TimerBuilder::new(config)
    }

    /// Start a run. No-op while running.
    pub fn start(&mut self) {
        if self.state == TimerState::Running {
            return;
        }

        let now = self.clock.now();
        self.drift.reset(Some(now));
        self.start_time = match self.mode {
            TimerMode::Countdown | TimerMode::Timer => self.settings.from,
            TimerMode::Countup | TimerMode::Stopwatch | TimerMode::Clock => now,
        };
        self.elapsed = 0.0;

        self.render_at(now, 0.0);
        self.arm();
        self.state = TimerState::Running;

        debug!(mode = %self.mode, start_time = self.start_time, "timer started");
        self.events.emit(&TimerEvent::Start);
    }

    /// Suspend ticking and freeze elapsed time. No-op unless running.
    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            return;
        }

        self.disarm();
        let now = self.clock.now();
        self.elapsed = (now - self.start_time).max(0.0);
        self.state = TimerState::Paused;

        debug!(elapsed = self.elapsed, "timer paused");
        self.events.emit(&TimerEvent::Pause);
    }

    /// Continue a paused run. No-op unless paused.
    pub fn resume(&mut self) {
        if self.state != TimerState::Paused {
            return;
        }

        let now = self.clock.now();
        // Re-anchor so the run-clock continues from the frozen elapsed time
        self.start_time = now - self.elapsed;
        self.drift.reset(Some(now));
        self.arm();
        self.state = TimerState::Running;

        debug!(elapsed = self.elapsed, "timer resumed");
        self.events.emit(&TimerEvent::Resume);
    }

    /// End the run and rewind to the configured anchor. No-op unless running.
    pub fn stop(&mut self) {
        if self.state != TimerState::Running {
            return;
        }

        self.disarm();
        self.elapsed = 0.0;
        self.start_time = self.settings.from;
        self.state = TimerState::Stopped;

        debug!("timer stopped");
        self.events.emit(&TimerEvent::Stop);
    }

    /// Return to `Idle` from any state and redraw the initial reading.
    pub fn reset(&mut self) {
        self.disarm();
        self.elapsed = 0.0;
        self.start_time = self.settings.from;
        self.state = TimerState::Idle;

        let now = self.clock.now();
        self.render_at(now, 0.0);
        debug!("timer reset");
    }

    /// Cancel any outstanding schedule and drop the engine
    pub fn destroy(mut self) {
        self.disarm();
    }

    /// Scheduler entry point. Ticks only for the live handle; returns
    /// whether a tick ran.
    pub fn fire(&mut self, handle: TickHandle) -> bool {
        if self.handle != Some(handle) || self.state != TimerState::Running {
            self.stats.stale_fires += 1;
            debug!(?handle, live = ?self.handle, "stale tick ignored");
            return false;
        }
        self.tick();
        true
    }

    /// One tick: sample drift, compute the mode value, render and notify.
    /// No-op unless running.
    pub fn tick(&mut self) {
        if self.state != TimerState::Running {
            return;
        }

        let now = self.clock.now();
        let drift = match self.drift.sample(now) {
            Ok(drift) => drift,
            Err(e) => {
                warn!(error = %e, "drift sample rejected, treating tick as on time");
                0.0
            }
        };
        let contribution = self.drift.corrected_elapsed();

        self.stats.ticks += 1;
        self.stats.last_drift = drift;
        self.stats.max_drift = self.stats.max_drift.max(drift);
        self.stats.corrected_elapsed += contribution;

        let (value, reading) = self.render_at(now, drift);
        let formatted = format_reading(&reading, &self.settings.display);
        self.events.emit(&TimerEvent::Tick(TickUpdate {
            value,
            drift,
            reading,
            formatted,
        }));

        if self.mode == TimerMode::Countdown && value <= 0.0 {
            self.complete(now);
        }
    }

    /// Per-mode value at `now` with `drift` applied, in milliseconds.
    /// Clock mode yields the shifted wall-clock instant; every other mode is
    /// floored at zero.
    pub fn value_at(&self, now: f64, drift: f64) -> f64 {
        match self.mode {
            TimerMode::Countdown => match self.settings.to {
                Some(to) => (to - now + drift).max(0.0),
                // resolve() switches an endless countdown to countup
                None => self.count_up(now, drift),
            },
            TimerMode::Countup => self.count_up(now, drift),
            TimerMode::Stopwatch => self.elapsed_at(now, drift),
            TimerMode::Timer => {
                let elapsed = self.elapsed_at(now, drift);
                if self.settings.duration > 0.0 {
                    (self.settings.duration - elapsed).max(0.0)
                } else {
                    elapsed
                }
            }
            TimerMode::Clock => now + self.settings.offset_millis(),
        }
    }

    /// Run time at `now`: live while running, frozen otherwise
    pub fn elapsed_at(&self, now: f64, drift: f64) -> f64 {
        if self.state == TimerState::Running {
            self.count_up(now, drift)
        } else {
            self.elapsed
        }
    }

    /// Value at the clock's current reading, using the last sampled drift
    pub fn current_value(&self) -> f64 {
        self.value_at(self.clock.now(), self.drift.last_drift())
    }

    pub fn current_reading(&self) -> Reading {
        self.reading_for(self.current_value())
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&TimerEvent) + Send + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    #[inline]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[inline]
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Stored elapsed time (authoritative while not running)
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn drift(&self) -> &DriftCorrector {
        &self.drift
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Live tick handle, if running
    pub fn handle(&self) -> Option<TickHandle> {
        self.handle
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn count_up(&self, now: f64, drift: f64) -> f64 {
        (now - self.start_time + drift).max(0.0)
    }

    fn reading_for(&self, value: f64) -> Reading {
        match self.mode {
            TimerMode::Clock => Reading::Clock(ClockReading::from_epoch_millis(value)),
            _ => Reading::Span(TimeBreakdown::from_millis(value)),
        }
    }

    fn render_at(&mut self, now: f64, drift: f64) -> (f64, Reading) {
        let value = self.value_at(now, drift);
        let reading = self.reading_for(value);
        self.display.render(&reading, &self.settings.display);
        (value, reading)
    }

    fn arm(&mut self) {
        self.disarm();
        self.handle = Some(self.scheduler.schedule(self.settings.interval_duration()));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn complete(&mut self, now: f64) {
        self.stop();
        self.stats.completions += 1;
        debug!(completions = self.stats.completions, "countdown complete");
        self.events.emit(&TimerEvent::Complete);

        if self.settings.repeat {
            self.rearm_loop(now);
        }
    }

    /// Shift the countdown window to start at `now` and run it again
    fn rearm_loop(&mut self, now: f64) {
        match self.settings.span() {
            Some(span) if span > 0.0 => {
                self.settings.from = now;
                self.settings.to = Some(now + span);
                self.start_time = now;
                self.elapsed = 0.0;
                self.start();
            }
            _ => warn!("loop requested on a zero-length countdown, staying stopped"),
        }
    }
}

impl<C: Clock, S: Scheduler, D: DisplaySink> Drop for TimerEngine<C, S, D> {
    fn drop(&mut self) {
        self.disarm();
    }
}
