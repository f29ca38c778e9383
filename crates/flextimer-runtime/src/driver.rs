//! Timer Driver - runs one engine on a tokio task
//!
//! The driver owns the engine and multiplexes two channels:
//! - control commands from any number of `TimerControl` clones
//! - tick fires from the `TokioScheduler`
//!
//! Commands are polled first, so a pause issued before a queued fire is
//! applied before that fire and the fire is rejected as stale.

use flextimer_time::{Clock, DisplaySink, TimerBuilder, TimerEngine, TimerState};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{FireReceiver, RuntimeError, RuntimeResult, TokioScheduler};

/// Engine type driven on tokio
pub type DrivenEngine<C, D> = TimerEngine<C, TokioScheduler, D>;

/// Lifecycle request sent to a running driver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Shutdown,
}

/// Cloneable remote for a driver
#[derive(Clone, Debug)]
pub struct TimerControl {
    commands: mpsc::UnboundedSender<TimerCommand>,
}

impl TimerControl {
    pub fn send(&self, command: TimerCommand) -> RuntimeResult<()> {
        self.commands
            .send(command)
            .map_err(|_| RuntimeError::DriverClosed)
    }

    pub fn start(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Start)
    }

    pub fn pause(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Pause)
    }

    pub fn resume(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Resume)
    }

    pub fn stop(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Stop)
    }

    pub fn reset(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Reset)
    }

    pub fn shutdown(&self) -> RuntimeResult<()> {
        self.send(TimerCommand::Shutdown)
    }

    /// Whether the driver is still receiving
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Owns an engine and its tick channel
pub struct TimerDriver<C: Clock, D: DisplaySink> {
    engine: DrivenEngine<C, D>,
    commands: mpsc::UnboundedReceiver<TimerCommand>,
    fires: FireReceiver,
}

impl<C, D> TimerDriver<C, D>
where
    C: Clock,
    D: DisplaySink,
{
    /// Build the engine on a `TokioScheduler`. Must be called inside a tokio
    /// runtime, since an auto-starting engine schedules immediately.
    pub fn new(builder: TimerBuilder, display: D, clock: C) -> RuntimeResult<(Self, TimerControl)> {
        let (scheduler, fires) = TokioScheduler::new();
        let engine = builder.build(display, clock, scheduler)?;
        let (tx, commands) = mpsc::unbounded_channel();

        info!(
            mode = %engine.mode(),
            interval = engine.settings().interval,
            running = engine.is_running(),
            "timer driver ready"
        );

        let driver = TimerDriver {
            engine,
            commands,
            fires,
        };
        Ok((driver, TimerControl { commands: tx }))
    }

    pub fn engine(&self) -> &DrivenEngine<C, D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DrivenEngine<C, D> {
        &mut self.engine
    }

    /// Drive until `shutdown` or until every control is dropped.
    /// Returns the engine for inspection.
    pub async fn run(self) -> DrivenEngine<C, D> {
        self.drive(false).await
    }

    /// Like `run`, but also returns once a non-looping countdown completes
    pub async fn run_until_complete(self) -> DrivenEngine<C, D> {
        self.drive(true).await
    }

    async fn drive(mut self, until_complete: bool) -> DrivenEngine<C, D> {
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let keep_running = match command {
                        Some(command) => self.apply(command),
                        None => false,
                    };
                    if !keep_running {
                        debug!("timer driver shutting down");
                        break;
                    }
                }

                Some(handle) = self.fires.recv() => {
                    self.engine.fire(handle);
                    if until_complete && self.is_finished() {
                        debug!("countdown finished, leaving driver loop");
                        break;
                    }
                }
            }
        }
        self.engine
    }

    fn apply(&mut self, command: TimerCommand) -> bool {
        debug!(?command, state = ?self.engine.state(), "timer command");
        match command {
            TimerCommand::Start => self.engine.start(),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Resume => self.engine.resume(),
            TimerCommand::Stop => self.engine.stop(),
            TimerCommand::Reset => self.engine.reset(),
            TimerCommand::Shutdown => return false,
        }
        true
    }

    fn is_finished(&self) -> bool {
        self.engine.stats().completions > 0
            && !self.engine.settings().repeat
            && self.engine.state() == TimerState::Stopped
    }
}

impl<C, D> TimerDriver<C, D>
where
    C: Clock + Send + 'static,
    D: DisplaySink + Send + 'static,
{
    /// Run on a new tokio task
    pub fn spawn(self) -> JoinHandle<DrivenEngine<C, D>> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokioClock;
    use flextimer_core::{EventKind, TimerConfig, TimerMode};
    use flextimer_time::TextDisplay;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    const T0: f64 = 1_700_000_000_000.0;

    fn recording(config: TimerConfig) -> (TimerBuilder, Arc<Mutex<Vec<f64>>>) {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let builder = TimerBuilder::new(config).on_tick(move |update| sink.lock().push(update.value));
        (builder, values)
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_completion() {
        let (builder, values) = recording(TimerConfig::new().with_duration(3_000.0));
        let display = TextDisplay::new();
        let (driver, _control) =
            TimerDriver::new(builder, display.clone(), TokioClock::starting_at(T0)).unwrap();

        let engine = driver.run_until_complete().await;

        assert_eq!(*values.lock(), vec![2_000.0, 1_000.0, 0.0]);
        assert_eq!(engine.state(), TimerState::Stopped);
        assert_eq!(engine.stats().completions, 1);
        assert_eq!(engine.scheduler().active_count(), 0);
        assert_eq!(display.text(), "00 Days 00 Hours 00 Minutes 00 Seconds");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_over_channel() {
        let (builder, values) = recording(TimerConfig::new().with_mode(TimerMode::Countup));
        let (driver, control) =
            TimerDriver::new(builder, TextDisplay::new(), TokioClock::starting_at(T0)).unwrap();
        let task = driver.spawn();

        sleep(Duration::from_millis(2_500)).await;
        control.pause().unwrap();
        sleep(Duration::from_secs(10)).await;
        control.resume().unwrap();
        sleep(Duration::from_millis(1_500)).await;
        control.shutdown().unwrap();

        let engine = task.await.unwrap();
        let values = values.lock().clone();
        assert_eq!(values.len(), 3);
        assert_eq!(&values[..2], &[1_000.0, 2_000.0]);
        assert!((values[2] - 3_500.0).abs() < 1.0);
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.stats().stale_fires, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_start_after_idle() {
        let config = TimerConfig::new()
            .with_mode(TimerMode::Stopwatch)
            .with_auto_start(false);
        let started = Arc::new(Mutex::new(0u32));
        let counter = started.clone();
        let builder = TimerBuilder::new(config).on(EventKind::Start, move |_| *counter.lock() += 1);

        let (driver, control) =
            TimerDriver::new(builder, TextDisplay::new(), TokioClock::starting_at(T0)).unwrap();
        assert_eq!(driver.engine().state(), TimerState::Idle);
        let task = driver.spawn();

        control.start().unwrap();
        sleep(Duration::from_millis(1_200)).await;
        control.stop().unwrap();
        control.shutdown().unwrap();

        let engine = task.await.unwrap();
        assert_eq!(*started.lock(), 1);
        assert_eq!(engine.state(), TimerState::Stopped);
        assert_eq!(engine.stats().ticks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controls_ends_run() {
        let (driver, control) = TimerDriver::new(
            TimerBuilder::new(TimerConfig::new().with_mode(TimerMode::Countup)),
            TextDisplay::new(),
            TokioClock::starting_at(T0),
        )
        .unwrap();

        drop(control);
        let engine = driver.run().await;
        assert!(engine.is_running());
    }

    #[tokio::test]
    async fn test_control_reports_closed_driver() {
        let (driver, control) = TimerDriver::new(
            TimerBuilder::new(TimerConfig::new().with_duration(1_000.0)),
            TextDisplay::new(),
            TokioClock::new(),
        )
        .unwrap();
        assert!(control.is_connected());

        drop(driver);
        assert!(!control.is_connected());
        assert!(matches!(control.pause(), Err(RuntimeError::DriverClosed)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported() {
        let result = TimerDriver::new(
            TimerBuilder::new(TimerConfig::new().with_interval(0.0)),
            TextDisplay::new(),
            TokioClock::new(),
        );
        assert!(matches!(result, Err(RuntimeError::Timer(_))));
    }
}
