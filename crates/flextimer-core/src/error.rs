//! Error types for FlexTimer

use thiserror::Error;

/// Core FlexTimer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimerError {
    // Configuration errors
    #[error("Invalid rendering target: {0}")]
    InvalidTarget(String),

    #[error("Invalid start time: {0}")]
    InvalidStart(String),

    #[error("Invalid end time: {0}")]
    InvalidEnd(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    // Runtime errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TimerError {
    /// Errors that abort construction. No engine or display is created.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, TimerError::InvalidInput(_))
    }
}

/// Result type for FlexTimer operations
pub type TimerResult<T> = Result<T, TimerError>;
