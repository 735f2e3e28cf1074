//! Timer controller: state machine plus its single scheduled wake-up

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, sync::watch, time::Instant};
use tracing::{debug, error, info};

use super::wake_up::WakeUp;
use crate::{
    error::{Result, TimerError},
    state::{TimerCommand, TimerState},
};

/// Callback invoked once when a countdown runs out
pub type ExpiryCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Construction parameters for a [`TimerController`]
#[derive(Clone)]
pub struct TimerOptions {
    /// Full countdown duration, used initially and on every restart
    pub total_duration: Duration,
    /// Invoked on natural expiry, never on an explicit stop or pause
    pub on_expiry: ExpiryCallback,
}

impl TimerOptions {
    pub fn new<F>(total_duration: Duration, on_expiry: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            total_duration,
            on_expiry: Arc::new(on_expiry),
        }
    }

    pub fn from_millis<F>(total_duration_ms: u64, on_expiry: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(Duration::from_millis(total_duration_ms), on_expiry)
    }
}

impl fmt::Debug for TimerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerOptions")
            .field("total_duration", &self.total_duration)
            .finish_non_exhaustive()
    }
}

struct Inner {
    state: TimerState,
    wake_up: Option<WakeUp>,
    next_wake_up_id: u64,
    torn_down: bool,
}

struct Shared {
    total_duration: Duration,
    on_expiry: ExpiryCallback,
    runtime: Handle,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<TimerState>,
}

impl Shared {
    fn apply(self: &Arc<Self>, command: TimerCommand) -> Result<TimerState> {
        let mut inner = self.inner.lock().map_err(|_| TimerError::StatePoisoned)?;
        if inner.torn_down {
            return Err(TimerError::TornDown);
        }

        let next = inner
            .state
            .transition(command, self.total_duration, Instant::now());

        if next == inner.state {
            debug!("Timer command {} left state unchanged ({})", command, next.status);
            return Ok(next);
        }

        debug!(
            "Timer {} -> {} on {}, remaining {:?}",
            inner.state.status, next.status, command, next.remaining
        );
        inner.state = next.clone();
        self.reconcile(&mut inner);
        self.state_tx.send_replace(next.clone());

        Ok(next)
    }

    /// Bring the registered wake-up in line with the current status
    fn reconcile(self: &Arc<Self>, inner: &mut Inner) {
        if let Some(stale) = inner.wake_up.take() {
            stale.cancel();
        }

        if let Some(deadline) = inner.state.deadline() {
            let id = inner.next_wake_up_id;
            inner.next_wake_up_id += 1;

            let shared = Arc::downgrade(self);
            inner.wake_up = Some(WakeUp::schedule(&self.runtime, id, deadline, move |id| {
                if let Some(shared) = shared.upgrade() {
                    shared.expire(id);
                }
            }));
        }
    }

    fn expire(self: &Arc<Self>, id: u64) {
        {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(e) => {
                    error!("Failed to lock timer state on expiry: {}", e);
                    return;
                }
            };

            let registered = inner.wake_up.as_ref().map(WakeUp::id);
            if inner.torn_down || registered != Some(id) || !inner.state.is_running() {
                debug!("Ignoring stale wake-up #{}", id);
                return;
            }

            // Claiming the wake-up is the firing point; only teardown can
            // still suppress the callback.
            inner.wake_up = None;
        }

        if self.is_torn_down() {
            debug!("Wake-up #{} claimed after teardown, skipping callback", id);
            return;
        }

        info!("Timer expired");
        (self.on_expiry)();

        if let Err(e) = self.apply(TimerCommand::Stop) {
            debug!("Timer not stopped after expiry: {}", e);
        }
    }

    fn is_torn_down(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.torn_down)
            .unwrap_or(true)
    }

    fn teardown(&self) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner.torn_down {
            return;
        }

        inner.torn_down = true;
        if let Some(wake_up) = inner.wake_up.take() {
            wake_up.cancel();
        }
        debug!("Timer controller torn down");
    }
}

/// Pausable countdown bound to a tokio runtime.
///
/// Commands apply synchronously. After each transition the pending wake-up
/// is reconciled: at most one is outstanding, and only while running.
/// Dropping the controller tears it down.
pub struct TimerController {
    shared: Arc<Shared>,
}

impl TimerController {
    /// Create a stopped controller on the current tokio runtime
    pub fn new(options: TimerOptions) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        Self::with_runtime(options, runtime)
    }

    /// Create a stopped controller that schedules wake-ups on `runtime`
    pub fn with_runtime(options: TimerOptions, runtime: Handle) -> Result<Self> {
        let now = Instant::now();
        if options.total_duration.is_zero() || now.checked_add(options.total_duration).is_none() {
            return Err(TimerError::InvalidDuration);
        }

        let initial = TimerState::initial(options.total_duration, now);
        let (state_tx, _) = watch::channel(initial.clone());

        info!("Timer controller created with duration {:?}", options.total_duration);

        Ok(Self {
            shared: Arc::new(Shared {
                total_duration: options.total_duration,
                on_expiry: options.on_expiry,
                runtime,
                inner: Mutex::new(Inner {
                    state: initial,
                    wake_up: None,
                    next_wake_up_id: 0,
                    torn_down: false,
                }),
                state_tx,
            }),
        })
    }

    /// Start over from the full duration
    pub fn restart(&self) -> Result<TimerState> {
        self.dispatch(TimerCommand::Restart)
    }

    /// Continue from the stored remaining time
    pub fn resume(&self) -> Result<TimerState> {
        self.dispatch(TimerCommand::Resume)
    }

    /// Freeze the countdown
    pub fn pause(&self) -> Result<TimerState> {
        self.dispatch(TimerCommand::Pause)
    }

    /// Halt the countdown without firing the expiry callback
    pub fn stop(&self) -> Result<TimerState> {
        self.dispatch(TimerCommand::Stop)
    }

    pub fn dispatch(&self, command: TimerCommand) -> Result<TimerState> {
        self.shared.apply(command)
    }

    /// Parse and dispatch a command by name; unknown names leave the state untouched
    pub fn dispatch_named(&self, name: &str) -> Result<TimerState> {
        let command = name.parse::<TimerCommand>()?;
        self.dispatch(command)
    }

    /// Latest published state
    pub fn state(&self) -> TimerState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.state_tx.borrow().is_running()
    }

    /// Stored remaining time, see [`TimerState::remaining_time`]
    pub fn remaining_time(&self) -> Duration {
        self.shared.state_tx.borrow().remaining_time()
    }

    pub fn total_duration(&self) -> Duration {
        self.shared.total_duration
    }

    /// Check whether a wake-up is currently registered
    pub fn has_pending_wake_up(&self) -> bool {
        self.shared
            .inner
            .lock()
            .map(|inner| inner.wake_up.is_some())
            .unwrap_or(false)
    }

    /// Watch every state the controller transitions into
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.state_tx.subscribe()
    }

    /// Cancel any pending wake-up and reject further commands
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.is_torn_down()
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl fmt::Debug for TimerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerController")
            .field("total_duration", &self.shared.total_duration)
            .field("state", &*self.shared.state_tx.borrow())
            .finish_non_exhaustive()
    }
}
