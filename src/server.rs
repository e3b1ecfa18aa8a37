//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration for the trigger and operational endpoints
//! - Middleware stack (auth, request id, logging)
//! - Logging and metrics initialization
//! - Graceful shutdown handling

use crate::config::RelayConfig;
use crate::middleware::{cron_auth, log_requests, request_id};
use crate::routes::{health, not_found, sync};
use crate::state::ServerState;
use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Path the scheduler calls.
pub const TRIGGER_PATH: &str = "/api/cron/scrape";

/// Build the Axum router
///
/// - Public routes: /health, /metrics
/// - Protected routes: the cron trigger (bearer secret required)
///
/// Middleware, outermost first: trace, request id, request logging. The
/// trigger enforces its own time budget so a slow run still answers 500 JSON.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics));

    let protected_routes = Router::new()
        .route(TRIGGER_PATH, get(sync::trigger_sync))
        .layer(from_fn_with_state(state.clone(), cron_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &RelayConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

/// Start the relay HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use relay::RelayConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = RelayConfig::load()?;
///     relay::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: RelayConfig) -> anyhow::Result<()> {
    let mut state = ServerState::new(config.clone())?;
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        state = state.with_metrics(handle);
    }

    let app = build_router(Arc::new(state));
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!("Starting PrintSync relay on {}", addr);
    tracing::info!(
        "Upstream: {}, ingest: {}",
        config.upstream_url,
        config.ingest_url
    );
    tracing::info!(
        "Timeout: {}s per request, {}s per outbound call",
        config.timeout_secs,
        config.http_timeout_secs
    );
    tracing::info!("Metrics: {}", config.metrics_enabled);
    for name in config.missing_secrets() {
        tracing::warn!("{} is not set; using an empty credential", name);
    }
    if config.cron_secret.is_none() {
        tracing::warn!("Without CRON_SECRET every trigger is rejected");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
