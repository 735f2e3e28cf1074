//! Pausable Timer - An HTTP-controlled pausable countdown timer
//!
//! This is the main entry point for the pausable-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use pausable_timer::{
    api::create_router,
    config::Config,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pausable_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pausable-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, duration={}ms, on_expiry={:?}",
        config.host, config.port, config.duration_ms, config.on_expiry
    );

    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.total_duration(),
        config.on_expiry.clone(),
    )?);

    if config.autostart {
        state.dispatch("restart")?;
    }

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/restart - Start the countdown from the full duration");
    info!("  POST /timer/resume  - Continue a paused countdown");
    info!("  POST /timer/pause   - Pause the countdown");
    info!("  POST /timer/stop    - Stop the countdown");
    info!("  GET  /status        - Check timer status");
    info!("  GET  /health        - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.timer.teardown();
    info!("Server shutdown complete");
    Ok(())
}
