//! Single scheduled wake-up backing a running countdown

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::debug;

/// A pending wake-up registered with the tokio timer.
///
/// Owned by the controller while the countdown is running. Cancelling it aborts
/// the sleeping task; dropping it without cancelling lets an already firing
/// task finish.
#[derive(Debug)]
pub struct WakeUp {
    id: u64,
    handle: JoinHandle<()>,
}

impl WakeUp {
    /// Spawn a task that sleeps until `deadline` and then calls `on_fire` with `id`
    pub fn schedule<F>(runtime: &Handle, id: u64, deadline: Instant, on_fire: F) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        debug!("Scheduling wake-up #{} in {:?}", id, deadline.saturating_duration_since(Instant::now()));

        let handle = runtime.spawn(async move {
            sleep_until(deadline).await;
            on_fire(id);
        });

        Self { id, handle }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Abort the wake-up so it never fires
    pub fn cancel(self) {
        debug!("Cancelling wake-up #{}", self.id);
        self.handle.abort();
    }
}
