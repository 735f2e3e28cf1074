//! Pausable Timer - A pausable countdown timer with millisecond precision
//!
//! This library provides a timer controller that can be restarted, resumed,
//! paused and stopped, and that invokes a callback once when the countdown
//! runs out. It also ships a small HTTP host exposing one controller.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, TimerCommand, TimerState, TimerStatus};
pub use timer::{TimerController, TimerOptions};
pub use utils::signals::shutdown_signal;
