use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// MakerWorld "my recent print tasks" listing.
pub const DEFAULT_UPSTREAM_URL: &str = "https://makerworld.com/api/v1/user-service/my/tasks";

/// PrintSync ingestion endpoint.
pub const DEFAULT_INGEST_URL: &str = "https://printsync-web.vercel.app/api/prints";

/// Relay configuration
///
/// Built once at startup and handed to [`ServerState`](crate::state::ServerState),
/// so handlers never read the process environment themselves.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout applied to each outbound call, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Task history endpoint (queried with `limit=100`)
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Ingestion endpoint receiving the normalized batch
    #[serde(default = "default_ingest_url")]
    pub ingest_url: String,

    /// Session token sent upstream as the `token` cookie
    #[serde(default, skip_serializing)]
    pub upstream_token: Option<String>,

    /// Value of the `x-api-key` header on the forward call
    #[serde(default, skip_serializing)]
    pub ingest_api_key: Option<String>,

    /// Shared secret expected in `Authorization: Bearer <secret>`
    #[serde(default, skip_serializing)]
    pub cron_secret: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default = "default_true")]
    pub log_json: bool,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            upstream_url: default_upstream_url(),
            ingest_url: default_ingest_url(),
            upstream_token: None,
            ingest_api_key: None,
            cron_secret: None,
            log_level: default_log_level(),
            log_json: default_true(),
            metrics_enabled: default_true(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from an optional `relay.*` file, `PRINTSYNC__*`
    /// variables and the three secret variables.
    ///
    /// Missing secrets are not an error; they are carried as `None`.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("relay").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("PRINTSYNC").prefix_separator("__").separator("__"))
            .set_override_option("upstream_token", non_empty_env("MAKERWORLD_TOKEN"))?
            .set_override_option("ingest_api_key", non_empty_env("API_SECRET"))?
            .set_override_option("cron_secret", non_empty_env("CRON_SECRET"))?;

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Environment variables whose secret is not set.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        [
            ("MAKERWORLD_TOKEN", &self.upstream_token),
            ("API_SECRET", &self.ingest_api_key),
            ("CRON_SECRET", &self.cron_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get outbound call timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_ingest_url() -> String {
    DEFAULT_INGEST_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 90);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(cfg.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(cfg.ingest_url, DEFAULT_INGEST_URL);
        assert!(cfg.cron_secret.is_none());
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = RelayConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_outbound_timeout_is_thirty_seconds() {
        assert_eq!(RelayConfig::default().http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_secrets() {
        let cfg = RelayConfig {
            cron_secret: Some("shh".into()),
            ..RelayConfig::default()
        };
        assert_eq!(cfg.missing_secrets(), ["MAKERWORLD_TOKEN", "API_SECRET"]);
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let cfg = RelayConfig {
            cron_secret: Some("shh".into()),
            upstream_token: Some("tok".into()),
            ingest_api_key: Some("key".into()),
            ..RelayConfig::default()
        };
        let rendered = serde_json::to_string(&cfg).unwrap();
        assert!(!rendered.contains("shh"));
        assert!(!rendered.contains("tok"));
        assert!(!rendered.contains("\"key\""));
    }
}
