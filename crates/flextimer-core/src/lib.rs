//! FlexTimer Core - Fundamental types and primitives
//!
//! This crate defines the types shared by the timing engine and its hosts:
//! - Errors (TimerError, TimerResult)
//! - Time primitives (TimeBreakdown, ClockReading, Reading)
//! - Configuration (TimerConfig, TimerSettings, DisplayOptions)
//! - Lifecycle events (EventKind, TimerEvent, TickUpdate)
//! - Text formatting of readings

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod time;

pub use config::*;
pub use error::*;
pub use event::*;
pub use format::*;
pub use time::*;
