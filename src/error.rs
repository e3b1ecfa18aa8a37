use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub type RelayResult<T> = Result<T, RelayError>;

/// Relay error types
///
/// Variants separate the failure kinds for logs and metrics. On the wire
/// every sync failure collapses into the same 500 `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("upstream returned invalid JSON: {0}")]
    UpstreamDecode(#[source] serde_json::Error),

    #[error("task entry {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("ingest request failed: {0}")]
    Downstream(#[source] reqwest::Error),

    #[error("ingest returned invalid JSON: {0}")]
    DownstreamDecode(#[source] serde_json::Error),

    #[error("sync did not finish within {0}s")]
    Timeout(u64),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Metrics are disabled")]
    MetricsDisabled,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl RelayError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::NotFound | RelayError::MetricsDisabled => StatusCode::NOT_FOUND,
            RelayError::Upstream(_)
            | RelayError::UpstreamDecode(_)
            | RelayError::MissingField { .. }
            | RelayError::Downstream(_)
            | RelayError::DownstreamDecode(_)
            | RelayError::Timeout(_)
            | RelayError::Client(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and as the `kind` metric label
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Unauthorized => "unauthorized",
            RelayError::Upstream(err) | RelayError::Downstream(err) if err.is_timeout() => {
                "timeout"
            }
            RelayError::Upstream(_) => "upstream",
            RelayError::UpstreamDecode(_) => "upstream_decode",
            RelayError::MissingField { .. } => "normalize",
            RelayError::Downstream(_) => "downstream",
            RelayError::DownstreamDecode(_) => "downstream_decode",
            RelayError::Timeout(_) => "timeout",
            RelayError::Client(_) => "client",
            RelayError::MetricsDisabled => "metrics_disabled",
            RelayError::Internal(_) => "internal",
            RelayError::NotFound => "not_found",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
