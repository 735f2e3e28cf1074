//! Signal handling for graceful shutdown

use std::{future::Future, io};

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::{error, info};

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Failed to create signal handler: {}, falling back to Ctrl-C", e);
            wait_for_ctrl_c(tokio::signal::ctrl_c()).await;
            return;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
}

/// Resolve when `listener` reports Ctrl-C. A listener that fails never resolves,
/// so the server keeps running instead of shutting down.
async fn wait_for_ctrl_c<F>(listener: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        error!("Failed to listen for Ctrl-C: {}, running without signal handling", e);
        std::future::pending::<()>().await;
    }
}
