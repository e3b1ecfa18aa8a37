use crate::error::{RelayError, RelayResult};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "printsync-relay",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> RelayResult<impl IntoResponse> {
    let handle = state.metrics.as_ref().ok_or(RelayError::MetricsDisabled)?;
    Ok((
        [("content-type", "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
