//! Application state shared by the HTTP host

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    services::execute_expiry_command,
    timer::{TimerController, TimerOptions},
};
use super::TimerState;

/// Expiry bookkeeping filled in by the controller's expiry callback
#[derive(Debug, Default)]
pub struct ExpiryRecord {
    count: AtomicU64,
    last_expired_at: Mutex<Option<DateTime<Utc>>>,
    errors: Mutex<Vec<String>>,
}

impl ExpiryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one natural expiry of the countdown
    pub fn record_expiry(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_expired_at.lock() {
            *last = Some(Utc::now());
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last_expired_at(&self) -> Option<DateTime<Utc>> {
        self.last_expired_at.lock().ok().and_then(|t| *t)
    }

    /// Add an error for client visibility
    pub fn add_error(&self, error: String) {
        warn!("Adding error to state: {}", error);
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error);
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Main application state: the hosted timer plus server metadata
#[derive(Debug)]
pub struct AppState {
    pub timer: TimerController,
    pub expiry: Arc<ExpiryRecord>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create the state and its timer controller on the current tokio runtime.
    ///
    /// On expiry the controller records the event and, when `expiry_command`
    /// is set, runs it in the background.
    pub fn new(
        port: u16,
        host: String,
        total_duration: Duration,
        expiry_command: Option<String>,
    ) -> Result<Self, TimerError> {
        let expiry = Arc::new(ExpiryRecord::new());

        let record = Arc::clone(&expiry);
        let options = TimerOptions::new(total_duration, move || {
            record.record_expiry();
            info!("Countdown expired ({} total)", record.count());

            if let Some(command) = expiry_command.clone() {
                let record = Arc::clone(&record);
                tokio::spawn(async move {
                    if let Err(e) = execute_expiry_command(&command).await {
                        error!("Expiry command failed: {}", e);
                        record.add_error(format!("Expiry command failed: {}", e));
                    }
                });
            }
        });

        Ok(Self {
            timer: TimerController::new(options)?,
            expiry,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        })
    }

    /// Dispatch a named command to the timer and track it as the last action
    pub fn dispatch(&self, action: &str) -> Result<TimerState, TimerError> {
        let state = self.timer.dispatch_named(action)?;
        info!("Timer command {} applied, status now {}", action, state.status);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        Ok(state)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
