//! Timer state structure and the pure transition function

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::TimerError;

/// Lifecycle status of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Stopped => "stopped",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Commands accepted by the timer controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCommand {
    /// Start over from the full duration
    Restart,
    /// Continue counting down from the stored remaining time
    Resume,
    /// Freeze the countdown and store what is left
    Pause,
    /// Halt the countdown, keeping the stored remaining time
    Stop,
}

impl TimerCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerCommand::Restart => "restart",
            TimerCommand::Resume => "resume",
            TimerCommand::Pause => "pause",
            TimerCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerCommand {
    type Err = TimerError;

    /// Parse a command name. Accepts the short names as well as the
    /// `*_TIMER` action names, ignoring case.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_lowercase();
        let short = normalized.strip_suffix("_timer").unwrap_or(&normalized);

        match short {
            "restart" => Ok(TimerCommand::Restart),
            "resume" => Ok(TimerCommand::Resume),
            "pause" => Ok(TimerCommand::Pause),
            "stop" => Ok(TimerCommand::Stop),
            _ => Err(TimerError::InvalidCommand(name.to_string())),
        }
    }
}

/// Snapshot of a countdown. Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub status: TimerStatus,
    /// When the timer last entered `Running`
    pub started_at: Instant,
    /// Remaining duration as of the last transition
    pub remaining: Duration,
}

impl TimerState {
    /// Create a stopped timer holding the full duration
    pub fn initial(total: Duration, now: Instant) -> Self {
        Self {
            status: TimerStatus::Stopped,
            started_at: now,
            remaining: total,
        }
    }

    /// Compute the state that follows `command` at time `now`.
    ///
    /// Every command is valid from every status. Pausing subtracts the time
    /// elapsed since the last start, clamped at zero; pausing an already
    /// paused timer changes nothing.
    pub fn transition(&self, command: TimerCommand, total: Duration, now: Instant) -> Self {
        match (self.status, command) {
            (_, TimerCommand::Restart) => Self {
                status: TimerStatus::Running,
                started_at: now,
                remaining: total,
            },
            (_, TimerCommand::Resume) => Self {
                status: TimerStatus::Running,
                started_at: now,
                remaining: self.remaining,
            },
            (TimerStatus::Paused, TimerCommand::Pause) => self.clone(),
            (TimerStatus::Running | TimerStatus::Stopped, TimerCommand::Pause) => Self {
                status: TimerStatus::Paused,
                started_at: self.started_at,
                remaining: self.elapsed_remaining(now),
            },
            (_, TimerCommand::Stop) => Self {
                status: TimerStatus::Stopped,
                ..self.clone()
            },
        }
    }

    /// Check if the countdown is running
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Stored remaining time. While running this is the value at the last
    /// transition, not a live countdown.
    pub fn remaining_time(&self) -> Duration {
        self.remaining
    }

    /// Remaining time as observed at `now`
    pub fn remaining_at(&self, now: Instant) -> Duration {
        if self.is_running() {
            self.elapsed_remaining(now)
        } else {
            self.remaining
        }
    }

    fn elapsed_remaining(&self, now: Instant) -> Duration {
        self.remaining
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    /// Instant at which a running countdown expires. `None` when stopped,
    /// paused, or when the deadline is past what the clock can represent.
    pub fn deadline(&self) -> Option<Instant> {
        if self.is_running() {
            self.started_at.checked_add(self.remaining)
        } else {
            None
        }
    }
}
