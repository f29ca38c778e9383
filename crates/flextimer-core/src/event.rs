//! Lifecycle events
//!
//! Every transition of a timer is announced as a `TimerEvent`. Listeners
//! subscribe by `EventKind`; only `Tick` carries a payload.

use std::fmt;

use crate::Reading;

/// Event classification, used as the subscription key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Start,
    Pause,
    Resume,
    Stop,
    Tick,
    Complete,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Start,
        EventKind::Pause,
        EventKind::Resume,
        EventKind::Stop,
        EventKind::Tick,
        EventKind::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Pause => "pause",
            EventKind::Resume => "resume",
            EventKind::Stop => "stop",
            EventKind::Tick => "tick",
            EventKind::Complete => "complete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a tick notification
#[derive(Clone, Debug, PartialEq)]
pub struct TickUpdate {
    /// Mode value in milliseconds (remaining, elapsed, or wall-clock instant)
    pub value: f64,
    /// Drift sampled for this tick
    pub drift: f64,
    /// Unit breakdown handed to the display
    pub reading: Reading,
    /// Text rendering of `reading` under the display options
    pub formatted: String,
}

/// A timer lifecycle notification
#[derive(Clone, Debug, PartialEq)]
pub enum TimerEvent {
    Start,
    Pause,
    Resume,
    Stop,
    Tick(TickUpdate),
    Complete,
}

impl TimerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TimerEvent::Start => EventKind::Start,
            TimerEvent::Pause => EventKind::Pause,
            TimerEvent::Resume => EventKind::Resume,
            TimerEvent::Stop => EventKind::Stop,
            TimerEvent::Tick(_) => EventKind::Tick,
            TimerEvent::Complete => EventKind::Complete,
        }
    }

    pub fn as_tick(&self) -> Option<&TickUpdate> {
        match self {
            TimerEvent::Tick(update) => Some(update),
            _ => None,
        }
    }
}
