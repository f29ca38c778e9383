//! FlexTimer Time Engine - drift correction and the timer state machine
//!
//! This crate implements the timing engine:
//! - Clock sources (system and manual)
//! - DriftCorrector: tick lateness against the nominal interval
//! - Scheduler seam for the host's periodic callback
//! - Display seam and the lifecycle event bus
//! - TimerEngine: start/pause/resume/stop/tick and per-mode arithmetic

pub mod clock;
pub mod display;
pub mod drift;
pub mod engine;
pub mod events;
pub mod schedule;

pub use clock::*;
pub use display::*;
pub use drift::*;
pub use engine::*;
pub use events::*;
pub use schedule::*;
