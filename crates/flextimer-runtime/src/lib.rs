//! FlexTimer Runtime - drives timer engines on tokio
//!
//! The engine itself never sleeps or spawns. This crate supplies:
//! - TokioScheduler: one `tokio::time::interval` task per tick handle
//! - TokioClock: epoch clock that follows tokio's (pausable) time
//! - TimerDriver: select loop over control commands and tick fires
//! - Configuration loading from JSON
//! - tracing-subscriber installation

pub mod driver;
pub mod error;
pub mod loader;
pub mod scheduler;
pub mod telemetry;

pub use driver::*;
pub use error::*;
pub use loader::*;
pub use scheduler::*;
pub use telemetry::*;
