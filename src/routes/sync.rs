use crate::error::{RelayError, RelayResult};
use crate::pipeline::{SyncSummary, run_sync};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

/// Cron trigger: relay the latest print history downstream.
///
/// Authorization happens in [`cron_auth`](crate::middleware::cron_auth)
/// before this runs. Every failure past that point becomes a 500 with the
/// error message as the body, including a run that outlives
/// `timeout_secs`.
///
/// # Response
///
/// ```json
/// { "success": true, "synced": 12 }
/// ```
pub async fn trigger_sync(State(state): State<Arc<ServerState>>) -> RelayResult<Json<SyncSummary>> {
    let budget = state.config.timeout();
    let outcome = tokio::time::timeout(budget, run_sync(&state.tasks, &state.ingest))
        .await
        .unwrap_or(Err(RelayError::Timeout(budget.as_secs())));

    match outcome {
        Ok(summary) => {
            metrics::counter!("relay_sync_runs_total", "outcome" => "success").increment(1);
            Ok(Json(summary))
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "sync failed");
            metrics::counter!("relay_sync_runs_total", "outcome" => err.kind()).increment(1);
            Err(err)
        }
    }
}
