//! PrintSync ingestion client.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::{RelayError, RelayResult};
use crate::record::NormalizedPrintRecord;

/// What the ingestion API reports back. `count` is optional.
#[derive(Debug, Default, Deserialize)]
pub struct IngestReceipt {
    #[serde(default)]
    pub count: Option<u64>,
}

/// Posts normalized batches to the ingestion API.
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: reqwest::Client,
    url: String,
}

impl IngestClient {
    pub fn new(url: impl Into<String>, api_key: Option<&str>, timeout: Duration) -> RelayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key.unwrap_or_default())
            .map_err(|e| RelayError::Internal(format!("invalid ingest API key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// POST the whole batch as one JSON array.
    pub async fn forward(&self, records: &[NormalizedPrintRecord]) -> RelayResult<IngestReceipt> {
        let response = self
            .http
            .post(&self.url)
            .json(records)
            .send()
            .await
            .map_err(RelayError::Downstream)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "ingest API returned a non-success status");
        }

        let body = response.bytes().await.map_err(RelayError::Downstream)?;
        serde_json::from_slice(&body).map_err(RelayError::DownstreamDecode)
    }
}
