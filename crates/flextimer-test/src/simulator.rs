//! Tick Simulator - drives an engine through a jittery host scheduler
//!
//! Simulates:
//! - Constant host latency
//! - Random early/late jitter per fire
//! - Periodic stalls (throttled background tabs, GC pauses)
//!
//! Time is a `ManualClock`, so a run is fully determined by its seed.

use std::sync::Arc;

use flextimer_core::{EventKind, TickUpdate, TimerConfig, TimerEvent, TimerResult};
use flextimer_time::{
    Clock, ManualClock, ManualScheduler, TextDisplay, TimerBuilder, TimerEngine, TimerState,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Epoch milliseconds every simulation starts at
pub const SIM_EPOCH: f64 = 1_700_000_000_000.0;

/// Engine wired to simulated time
pub type SimulatedEngine = TimerEngine<ManualClock, ManualScheduler, TextDisplay>;

/// How late the host fires a periodic callback
#[derive(Clone, Debug, PartialEq)]
pub struct JitterModel {
    /// Added to every fire (ms)
    pub latency_ms: f64,
    /// Uniform jitter in `[-jitter_ms, jitter_ms]`
    pub jitter_ms: f64,
    /// Stall on every n-th fire
    pub stall_every: Option<u64>,
    /// Extra delay of a stalled fire (ms)
    pub stall_ms: f64,
}

impl JitterModel {
    pub fn new(latency_ms: f64, jitter_ms: f64) -> Self {
        JitterModel {
            latency_ms,
            jitter_ms,
            stall_every: None,
            stall_ms: 0.0,
        }
    }

    /// Fires exactly on the interval
    pub fn perfect() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Loaded event loop: a little late, noisy
    pub fn busy() -> Self {
        Self::new(2.0, 5.0)
    }

    /// Background tab: timers clamped, long stalls every ten fires
    pub fn throttled() -> Self {
        Self::new(0.0, 1.0).with_stall(10, 3_000.0)
    }

    pub fn with_stall(mut self, every: u64, stall_ms: f64) -> Self {
        self.stall_every = Some(every);
        self.stall_ms = stall_ms;
        self
    }

    /// Spacing before fire number `fire` (0-based)
    pub fn gap(&self, interval: f64, fire: u64, rng: &mut StdRng) -> f64 {
        let jitter = if self.jitter_ms > 0.0 {
            rng.gen_range(-self.jitter_ms..=self.jitter_ms)
        } else {
            0.0
        };
        let stall = match self.stall_every {
            Some(every) if every > 0 && fire > 0 && fire % every == 0 => self.stall_ms,
            _ => 0.0,
        };
        (interval + self.latency_ms + jitter + stall).max(0.0)
    }
}

impl Default for JitterModel {
    fn default() -> Self {
        Self::perfect()
    }
}

/// One engine plus the simulated host around it
pub struct TickSimulator {
    engine: SimulatedEngine,
    clock: ManualClock,
    scheduler: ManualScheduler,
    display: TextDisplay,
    model: JitterModel,
    rng: StdRng,
    fires: u64,
    updates: Arc<Mutex<Vec<TickUpdate>>>,
    events: Arc<Mutex<Vec<EventKind>>>,
}

impl TickSimulator {
    /// Build the engine at `SIM_EPOCH`. Hooks already on `builder` are kept.
    pub fn new(builder: TimerBuilder, model: JitterModel, seed: u64) -> TimerResult<Self> {
        let clock = ManualClock::new(SIM_EPOCH);
        let scheduler = ManualScheduler::new();
        let display = TextDisplay::new();
        let updates = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));

        let mut builder = builder;
        for kind in EventKind::ALL {
            let sink = events.clone();
            builder = builder.on(kind, move |event: &TimerEvent| sink.lock().push(event.kind()));
        }
        let sink = updates.clone();
        builder = builder.on_tick(move |update| sink.lock().push(update.clone()));

        let engine = builder.build(display.clone(), clock.clone(), scheduler.clone())?;

        Ok(TickSimulator {
            engine,
            clock,
            scheduler,
            display,
            model,
            rng: StdRng::seed_from_u64(seed),
            fires: 0,
            updates,
            events,
        })
    }

    pub fn from_config(config: TimerConfig, model: JitterModel, seed: u64) -> TimerResult<Self> {
        Self::new(TimerBuilder::new(config), model, seed)
    }

    /// Let the host fire the live schedule once.
    /// Returns false when nothing is scheduled or the fire was rejected.
    pub fn step(&mut self) -> bool {
        let Some(handle) = self.scheduler.current() else {
            return false;
        };
        let gap = self
            .model
            .gap(self.engine.settings().interval, self.fires, &mut self.rng);
        self.fires += 1;
        self.clock.advance(gap);
        self.engine.fire(handle)
    }

    /// Fire up to `max_fires` times, stopping early once nothing is scheduled
    pub fn run(&mut self, max_fires: u64) -> SimulationReport {
        for _ in 0..max_fires {
            if !self.step() {
                break;
            }
        }
        self.report()
    }

    /// Fire until the next completion, or `max_fires`
    pub fn run_until_complete(&mut self, max_fires: u64) -> SimulationReport {
        let target = self.engine.stats().completions + 1;
        for _ in 0..max_fires {
            if !self.step() || self.engine.stats().completions >= target {
                break;
            }
        }
        self.report()
    }

    pub fn report(&self) -> SimulationReport {
        let updates = self.updates.lock();
        let stats = self.engine.stats();
        let mean_drift = if updates.is_empty() {
            0.0
        } else {
            updates.iter().map(|u| u.drift).sum::<f64>() / updates.len() as f64
        };

        SimulationReport {
            ticks: stats.ticks,
            completions: stats.completions,
            max_drift: stats.max_drift,
            mean_drift,
            corrected_elapsed: stats.corrected_elapsed,
            wall_elapsed: self.elapsed(),
            final_value: updates.last().map_or(0.0, |u| u.value),
            final_state: self.engine.state(),
        }
    }

    /// Simulated time since the start
    pub fn elapsed(&self) -> f64 {
        self.clock.now() - SIM_EPOCH
    }

    pub fn engine(&self) -> &SimulatedEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulatedEngine {
        &mut self.engine
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn display(&self) -> &TextDisplay {
        &self.display
    }

    pub fn updates(&self) -> Vec<TickUpdate> {
        self.updates.lock().clone()
    }

    pub fn values(&self) -> Vec<f64> {
        self.updates.lock().iter().map(|u| u.value).collect()
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.events.lock().clone()
    }
}

/// Outcome of a simulated run
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub ticks: u64,
    pub completions: u64,
    pub max_drift: f64,
    pub mean_drift: f64,
    /// Sum of the corrector's per-tick contributions (ms)
    pub corrected_elapsed: f64,
    /// Simulated time that passed (ms)
    pub wall_elapsed: f64,
    /// Value of the last tick
    pub final_value: f64,
    pub final_state: TimerState,
}

impl SimulationReport {
    /// Lateness the corrector shaved off, in ms
    pub fn shaved(&self) -> f64 {
        self.wall_elapsed - self.corrected_elapsed
    }
}

/// Predefined load scenarios
pub mod scenarios {
    use super::*;
    use flextimer_core::TimerMode;

    /// Countdown over `seconds` on a perfect host
    pub fn steady_countdown(seconds: u32) -> TimerResult<TickSimulator> {
        let config = TimerConfig::new().with_duration(seconds as f64 * 1_000.0);
        TickSimulator::from_config(config, JitterModel::perfect(), 0)
    }

    /// Countdown over `seconds` on a loaded host
    pub fn busy_countdown(seconds: u32, seed: u64) -> TimerResult<TickSimulator> {
        let config = TimerConfig::new().with_duration(seconds as f64 * 1_000.0);
        TickSimulator::from_config(config, JitterModel::busy(), seed)
    }

    /// Stopwatch in a throttled background tab
    pub fn throttled_stopwatch(seed: u64) -> TimerResult<TickSimulator> {
        let config = TimerConfig::new().with_mode(TimerMode::Stopwatch);
        TickSimulator::from_config(config, JitterModel::throttled(), seed)
    }

    /// Looping countdown with a `span_ms` window on a perfect host
    pub fn looping_countdown(span_ms: f64) -> TimerResult<TickSimulator> {
        let config = TimerConfig::new().with_duration(span_ms).with_loop(true);
        TickSimulator::from_config(config, JitterModel::perfect(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flextimer_core::TimerMode;
    use proptest::prelude::*;

    #[test]
    fn test_perfect_countdown() {
        let mut sim = scenarios::steady_countdown(10).unwrap();
        let report = sim.run_until_complete(100);

        assert_eq!(report.ticks, 10);
        assert_eq!(report.completions, 1);
        assert_eq!(report.max_drift, 0.0);
        assert_eq!(report.final_value, 0.0);
        assert_eq!(report.final_state, TimerState::Stopped);
        assert_eq!(report.shaved(), 0.0);
        assert_eq!(
            sim.values(),
            (0..10).rev().map(|s| s as f64 * 1_000.0).collect::<Vec<_>>()
        );
        assert_eq!(sim.display().text(), "00 Days 00 Hours 00 Minutes 00 Seconds");

        // Nothing scheduled after completion
        assert!(!sim.step());
    }

    #[test]
    fn test_busy_countdown_never_counts_back_up() {
        let mut sim = scenarios::busy_countdown(10, 7).unwrap();
        let report = sim.run_until_complete(100);

        let values = sim.values();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(report.completions, 1);
        assert_eq!(report.final_value, 0.0);
        assert!((10..=11).contains(&report.ticks));

        // Within one interval of the target, plus the host's worst lateness
        let model = JitterModel::busy();
        let slack = 1_000.0 + 2.0 * (model.latency_ms + model.jitter_ms);
        assert!((report.wall_elapsed - 10_000.0).abs() < slack);

        let events = sim.events();
        assert_eq!(events.first(), Some(&EventKind::Start));
        assert_eq!(
            &events[events.len() - 2..],
            &[EventKind::Stop, EventKind::Complete]
        );
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = scenarios::busy_countdown(5, 42).unwrap();
        let mut b = scenarios::busy_countdown(5, 42).unwrap();
        let mut c = scenarios::busy_countdown(5, 43).unwrap();

        a.run(20);
        b.run(20);
        c.run(20);

        assert_eq!(a.updates(), b.updates());
        assert_ne!(a.updates(), c.updates());
    }

    #[test]
    fn test_throttled_stopwatch_shaves_stalls() {
        let mut sim = scenarios::throttled_stopwatch(3).unwrap();
        let report = sim.run(30);

        assert_eq!(report.ticks, 30);
        assert!(report.max_drift >= 2_998.0);
        assert!(report.shaved() > 0.0);
        assert!(report.corrected_elapsed < report.wall_elapsed);
        assert_eq!(report.final_state, TimerState::Running);
        assert_eq!(sim.engine().mode(), TimerMode::Stopwatch);
    }

    #[test]
    fn test_looping_countdown_keeps_going() {
        let mut sim = scenarios::looping_countdown(3_000.0).unwrap();
        let report = sim.run(12);

        assert_eq!(report.completions, 4);
        assert_eq!(report.final_state, TimerState::Running);
        assert_eq!(sim.events().iter().filter(|k| **k == EventKind::Complete).count(), 4);
    }

    #[test]
    fn test_paused_engine_stops_simulation() {
        let mut sim = scenarios::throttled_stopwatch(1).unwrap();
        sim.run(3);
        sim.engine_mut().pause();

        assert!(!sim.step());
        assert_eq!(sim.report().ticks, 3);
    }

    #[test]
    fn test_stall_schedule() {
        let model = JitterModel::perfect().with_stall(4, 500.0);
        let mut rng = StdRng::seed_from_u64(0);
        let gaps: Vec<f64> = (0..9).map(|i| model.gap(100.0, i, &mut rng)).collect();
        assert_eq!(
            gaps,
            vec![100.0, 100.0, 100.0, 100.0, 600.0, 100.0, 100.0, 100.0, 600.0]
        );
    }

    proptest! {
        #[test]
        fn accumulator_stays_bounded_under_late_fires(seed in any::<u64>(), interval in 10.0f64..2_000.0) {
            // Every fire lands between one and two intervals after the last
            let model = JitterModel::new(interval * 0.5, interval * 0.45);
            let config = TimerConfig::new()
                .with_mode(TimerMode::Countup)
                .with_interval(interval);
            let mut sim = TickSimulator::from_config(config, model, seed).unwrap();

            for _ in 0..100 {
                prop_assert!(sim.step());
                let accumulated = sim.engine().drift().accumulated_drift();
                prop_assert!(accumulated >= 0.0);
                prop_assert!(accumulated <= interval);
            }
        }
    }
}
