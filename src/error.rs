//! Error types for the timer controller

use thiserror::Error;

/// Errors raised by the timer controller and its command parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// A command name that does not map to any timer command.
    /// This is an integration error on the caller's side.
    #[error("Invalid timer command: {0:?}")]
    InvalidCommand(String),

    /// The total duration must be greater than zero
    #[error("Timer duration must be greater than zero")]
    InvalidDuration,

    /// The controller was constructed outside of a tokio runtime
    #[error("No tokio runtime available to schedule wake-ups")]
    NoRuntime,

    /// The controller has been torn down and accepts no further commands
    #[error("Timer controller has been torn down")]
    TornDown,

    /// A thread panicked while holding the timer state lock
    #[error("Timer state lock poisoned")]
    StatePoisoned,
}

pub type Result<T> = std::result::Result<T, TimerError>;
