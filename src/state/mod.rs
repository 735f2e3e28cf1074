//! State management module
//!
//! This module contains the timer state machine and the state shared by the HTTP host.

pub mod app_state;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, ExpiryRecord};
pub use timer_state::{TimerCommand, TimerState, TimerStatus};
