//! Timer controller module
//!
//! This module binds the timer state machine to the tokio timer.

pub mod controller;
pub mod wake_up;

// Re-export main types
pub use controller::{ExpiryCallback, TimerController, TimerOptions};
pub use wake_up::WakeUp;
