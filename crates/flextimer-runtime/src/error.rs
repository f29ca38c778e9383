//! Runtime error types

use flextimer_core::TimerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("Timer driver is no longer running")]
    DriverClosed,

    #[error("Failed to install tracing subscriber: {0}")]
    Telemetry(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
