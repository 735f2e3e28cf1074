//! External command module
//!
//! This module contains the system operations triggered by the timer.

pub mod system;

// Re-export main functions
pub use system::*;
