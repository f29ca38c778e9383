//! Timer configuration
//!
//! `TimerConfig` is the option bag a host hands over: every field is
//! defaulted and keys are camelCase, so the same record deserializes from
//! JSON written for the widget. `TimerConfig::resolve` validates it once and
//! produces the `TimerSettings` the engine runs on.

use std::fmt;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate};

use serde::Deserialize;
use tracing::warn;

use crate::{is_valid_millis, TimerError, TimerResult, MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE};

/// Default tick period
pub const DEFAULT_INTERVAL_MS: f64 = 1_000.0;

/// Longest tick period accepted, the browser `setInterval` ceiling
pub const MAX_INTERVAL_MS: f64 = i32::MAX as f64;

/// Default unit labels: days, hours, minutes, seconds
pub const DEFAULT_LABELS: [&str; 4] = ["Days", "Hours", "Minutes", "Seconds"];

/// What the timer measures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Remaining time until `to`
    #[default]
    Countdown,
    /// Time since the run started
    Countup,
    /// Count-up that freezes while paused
    Stopwatch,
    /// Remaining part of `duration` (or elapsed run time without one)
    Timer,
    /// Current wall-clock time
    Clock,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Countdown => "countdown",
            TimerMode::Countup => "countup",
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Timer => "timer",
            TimerMode::Clock => "clock",
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smallest unit the display shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    Seconds,
    Milliseconds,
}

/// An instant as supplied by the host
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    /// Epoch milliseconds
    Millis(f64),
    /// Numeric string, RFC 3339 timestamp (any offset) or ISO date
    Text(String),
}

impl TimeInput {
    /// Epoch milliseconds, or `None` when the input is not a usable instant
    pub fn to_epoch_millis(&self) -> Option<f64> {
        match self {
            TimeInput::Millis(ms) => is_valid_millis(*ms).then_some(*ms),
            TimeInput::Text(text) => {
                let text = text.trim();
                if let Ok(ms) = text.parse::<f64>() {
                    return is_valid_millis(ms).then_some(ms);
                }
                let ms = parse_instant(text)?;
                is_valid_millis(ms).then_some(ms)
            }
        }
    }
}

/// RFC 3339 with offset, then date-only (UTC midnight), then the weak
/// space-separated UTC form
fn parse_instant(text: &str) -> Option<f64> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.timestamp_millis() as f64);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64);
    }
    let at = humantime::parse_rfc3339_weak(text).ok()?;
    let ms = match at.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs_f64() * 1_000.0,
        Err(before) => -(before.duration().as_secs_f64() * 1_000.0),
    };
    Some(ms)
}

impl fmt::Display for TimeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInput::Millis(ms) => write!(f, "{}", ms),
            TimeInput::Text(text) => write!(f, "{:?}", text),
        }
    }
}

/// A span as supplied by the host
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    /// Milliseconds
    Millis(f64),
    /// Numeric string or human form such as `"1h 30m"`
    Text(String),
    /// Unit record such as `{ "hours": 1, "minutes": 30 }`
    Parts(DurationParts),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DurationParts {
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
    pub milliseconds: f64,
}

impl DurationInput {
    /// Span in milliseconds; negative, non-finite or unparsable input fails
    pub fn to_millis(&self) -> TimerResult<f64> {
        match self {
            DurationInput::Millis(ms) => checked_span(*ms),
            DurationInput::Text(text) => {
                let text = text.trim();
                if let Ok(ms) = text.parse::<f64>() {
                    return checked_span(ms);
                }
                humantime::parse_duration(text)
                    .map(|d| d.as_secs_f64() * 1_000.0)
                    .map_err(|e| TimerError::InvalidDuration(format!("{:?}: {}", text, e)))
            }
            DurationInput::Parts(parts) => {
                let units = [
                    (parts.days, MS_PER_DAY),
                    (parts.hours, MS_PER_HOUR),
                    (parts.minutes, MS_PER_MINUTE),
                    (parts.seconds, 1_000),
                    (parts.milliseconds, 1),
                ];
                let mut total = 0.0;
                for (value, scale) in units {
                    total += checked_span(value)? * scale as f64;
                }
                checked_span(total)
            }
        }
    }
}

fn checked_span(ms: f64) -> TimerResult<f64> {
    if is_valid_millis(ms) && ms >= 0.0 {
        Ok(ms)
    } else {
        Err(TimerError::InvalidDuration(ms.to_string()))
    }
}

/// Which units the display shows and how they are labelled
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayOptions {
    pub precision: Precision,
    pub show_days: bool,
    pub show_hours: bool,
    pub show_minutes: bool,
    pub show_seconds: bool,
    pub show_milliseconds: bool,
    pub show_labels: bool,
    /// Days, hours, minutes, seconds
    pub labels: Vec<String>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            precision: Precision::Seconds,
            show_days: true,
            show_hours: true,
            show_minutes: true,
            show_seconds: true,
            show_milliseconds: false,
            show_labels: true,
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DisplayOptions {
    /// Label for unit `index`, empty when the host supplied fewer labels
    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or("")
    }

    /// Milliseconds are shown only at millisecond precision with the flag set
    pub fn shows_milliseconds(&self) -> bool {
        self.precision == Precision::Milliseconds && self.show_milliseconds
    }
}

/// Timer configuration as supplied by the host
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimerConfig {
    /// Start anchor; defaults to construction time
    pub from: Option<TimeInput>,
    /// End target
    pub to: Option<TimeInput>,
    /// Span used to derive `to` when it is absent
    pub duration: Option<DurationInput>,
    /// Tick period in milliseconds
    pub interval: f64,
    pub mode: TimerMode,
    /// Minutes added to explicit `from`/`to` and to clock readings
    pub timezone_offset: i32,
    #[serde(flatten)]
    pub display: DisplayOptions,
    /// Re-arm a countdown when it completes
    #[serde(rename = "loop")]
    pub repeat: bool,
    pub auto_start: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            from: None,
            to: None,
            duration: None,
            interval: DEFAULT_INTERVAL_MS,
            mode: TimerMode::Countdown,
            timezone_offset: 0,
            display: DisplayOptions::default(),
            repeat: false,
            auto_start: true,
        }
    }
}

impl TimerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: TimerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_from(mut self, from: f64) -> Self {
        self.from = Some(TimeInput::Millis(from));
        self
    }

    pub fn with_to(mut self, to: f64) -> Self {
        self.to = Some(TimeInput::Millis(to));
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(DurationInput::Millis(duration));
        self
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset = minutes;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    pub fn with_loop(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Validate the configuration against `now` (epoch ms).
    ///
    /// Invalid anchors, spans or intervals are fatal. A countdown without an
    /// end time is logged and continues as a countup.
    pub fn resolve(&self, now: f64) -> TimerResult<TimerSettings> {
        if !is_valid_millis(self.interval)
            || self.interval <= 0.0
            || self.interval > MAX_INTERVAL_MS
        {
            return Err(TimerError::InvalidInterval(self.interval.to_string()));
        }

        let offset = self.timezone_offset as f64 * MS_PER_MINUTE as f64;

        let from = match &self.from {
            Some(input) => {
                input
                    .to_epoch_millis()
                    .ok_or_else(|| TimerError::InvalidStart(input.to_string()))?
                    + offset
            }
            None => now,
        };

        let mut to = match &self.to {
            Some(input) => Some(
                input
                    .to_epoch_millis()
                    .ok_or_else(|| TimerError::InvalidEnd(input.to_string()))?
                    + offset,
            ),
            None => None,
        };

        let duration = match &self.duration {
            Some(input) => input.to_millis()?,
            None => 0.0,
        };

        if to.is_none() && duration > 0.0 {
            to = Some(from + duration);
        }

        let mut mode = self.mode;
        if mode == TimerMode::Countdown && to.is_none() {
            if self.from.is_none() && self.duration.is_none() {
                warn!("no time parameters supplied, counting up from now");
            } else {
                warn!(from, "countdown has no end time, falling back to countup");
            }
            mode = TimerMode::Countup;
        }

        Ok(TimerSettings {
            from,
            to,
            duration,
            interval: self.interval,
            mode,
            timezone_offset: self.timezone_offset,
            display: self.display.clone(),
            repeat: self.repeat,
            auto_start: self.auto_start,
        })
    }
}

/// Validated configuration the engine runs on
#[derive(Clone, Debug, PartialEq)]
pub struct TimerSettings {
    /// Start anchor (epoch ms)
    pub from: f64,
    /// End target (epoch ms)
    pub to: Option<f64>,
    /// Span in ms, 0 when unbounded
    pub duration: f64,
    /// Tick period in ms
    pub interval: f64,
    pub mode: TimerMode,
    pub timezone_offset: i32,
    pub display: DisplayOptions,
    pub repeat: bool,
    pub auto_start: bool,
}

impl TimerSettings {
    /// Tick period for the host scheduler, saturating at `MAX_INTERVAL_MS`
    pub fn interval_duration(&self) -> Duration {
        let max = Duration::from_millis(MAX_INTERVAL_MS as u64);
        Duration::try_from_secs_f64(self.interval / 1_000.0).map_or(max, |d| d.min(max))
    }

    /// Length of the countdown window
    pub fn span(&self) -> Option<f64> {
        self.to.map(|to| to - self.from)
    }

    /// Timezone offset in milliseconds
    pub fn offset_millis(&self) -> f64 {
        self.timezone_offset as f64 * MS_PER_MINUTE as f64
    }
}
