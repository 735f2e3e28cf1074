//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tokio::time::Instant;
use tracing::{error, warn};

use crate::{error::TimerError, state::AppState};
use super::responses::{
    duration_ms, ApiResponse, ErrorResponse, HealthResponse, StatusResponse, TimerView,
};

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(e: &TimerError) -> ErrorReply {
    let status = match e {
        TimerError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
        TimerError::TornDown => StatusCode::GONE,
        TimerError::InvalidDuration | TimerError::NoRuntime | TimerError::StatePoisoned => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

/// Handle POST /timer/:command - Apply restart, resume, pause or stop
pub async fn command_handler(
    State(state): State<Arc<AppState>>,
    Path(command): Path<String>,
) -> Result<Json<ApiResponse>, ErrorReply> {
    match state.dispatch(&command) {
        Ok(timer_state) => Ok(Json(ApiResponse::from_state(
            format!("Timer {} applied", command.to_ascii_lowercase()),
            &timer_state,
        ))),
        Err(e @ TimerError::InvalidCommand(_)) => {
            warn!("Rejected timer command: {}", e);
            Err(error_reply(&e))
        }
        Err(e) => {
            error!("Failed to apply timer command {}: {}", command, e);
            Err(error_reply(&e))
        }
    }
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer_state = state.timer.state();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: TimerView::from(&timer_state),
        total_duration_ms: duration_ms(state.timer.total_duration()),
        live_remaining_ms: duration_ms(timer_state.remaining_at(Instant::now())),
        expirations: state.expiry.count(),
        last_expired_at: state.expiry.last_expired_at(),
        errors: state.expiry.errors(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
