use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::ingest::IngestClient;
use crate::tasks::TaskClient;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Relay configuration
    pub config: Arc<RelayConfig>,

    /// Upstream task-history client
    pub tasks: TaskClient,

    /// Downstream ingestion client
    pub ingest: IngestClient,

    /// Prometheus render handle, absent when metrics are disabled
    pub metrics: Option<PrometheusHandle>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl ServerState {
    /// Create new server state without a metrics recorder
    pub fn new(config: RelayConfig) -> RelayResult<Self> {
        let timeout = config.http_timeout();
        let tasks = TaskClient::new(
            config.upstream_url.clone(),
            config.upstream_token.as_deref(),
            timeout,
        )?;
        let ingest = IngestClient::new(
            config.ingest_url.clone(),
            config.ingest_api_key.as_deref(),
            timeout,
        )?;

        Ok(Self {
            config: Arc::new(config),
            tasks,
            ingest,
            metrics: None,
            started_at: Instant::now(),
        })
    }

    /// Attach the handle `/metrics` renders from
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Check an `Authorization` header value against `Bearer <cron_secret>`.
    ///
    /// Without a configured secret nothing is authorized.
    pub fn is_authorized(&self, header: Option<&str>) -> bool {
        let (Some(secret), Some(header)) = (self.config.cron_secret.as_deref(), header) else {
            return false;
        };
        let expected = format!("Bearer {secret}");
        expected.as_bytes().ct_eq(header.as_bytes()).into()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_secret(secret: Option<&str>) -> ServerState {
        let config = RelayConfig {
            cron_secret: secret.map(str::to_string),
            ..RelayConfig::default()
        };
        ServerState::new(config).unwrap()
    }

    #[test]
    fn exact_bearer_match_only() {
        let state = state_with_secret(Some("s3cret"));
        assert!(state.is_authorized(Some("Bearer s3cret")));
        assert!(!state.is_authorized(Some("bearer s3cret")));
        assert!(!state.is_authorized(Some("Bearer s3cret ")));
        assert!(!state.is_authorized(Some("s3cret")));
        assert!(!state.is_authorized(Some("Bearer s3cre")));
        assert!(!state.is_authorized(None));
    }

    #[test]
    fn no_secret_rejects_everything() {
        let state = state_with_secret(None);
        assert!(!state.is_authorized(Some("Bearer ")));
        assert!(!state.is_authorized(Some("Bearer None")));
        assert!(!state.is_authorized(None));
    }
}
