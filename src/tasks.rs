//! MakerWorld task-history client.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use serde::Deserialize;

use crate::error::{RelayError, RelayResult};
use crate::record::RawTaskEntry;

/// Page size requested upstream. Tasks beyond it are not fetched.
pub const TASK_PAGE_LIMIT: u32 = 100;

const REFERER_URL: &str = "https://makerworld.com/en/studio/print-history";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Client-identity headers the MakerWorld web app sends.
const CLIENT_IDENTITY: [(&str, &str); 4] = [
    ("x-bbl-app-source", "makerworld"),
    ("x-bbl-client-name", "MakerWorld"),
    ("x-bbl-client-type", "web"),
    ("x-bbl-client-version", "00.00.00.01"),
];

/// Response body of the task listing.
#[derive(Debug, Default, Deserialize)]
pub struct TaskPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hits: Vec<RawTaskEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawTaskEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<RawTaskEntry>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Fetches the most recent print tasks for the configured account.
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    url: String,
}

impl TaskClient {
    /// Build a client whose every request carries the browser identity
    /// headers and the `token` cookie.
    pub fn new(url: impl Into<String>, token: Option<&str>, timeout: Duration) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(identity_headers(token.unwrap_or_default())?)
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// One GET with `limit=100`. The body is decoded whatever the status
    /// code; a missing `hits` list reads as empty.
    pub async fn fetch_recent(&self) -> RelayResult<Vec<RawTaskEntry>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("limit", TASK_PAGE_LIMIT)])
            .send()
            .await
            .map_err(RelayError::Upstream)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "task listing returned a non-success status");
        }

        let body = response.bytes().await.map_err(RelayError::Upstream)?;
        let page: TaskPage = serde_json::from_slice(&body).map_err(RelayError::UpstreamDecode)?;

        tracing::debug!(hits = page.hits.len(), "fetched task page");
        Ok(page.hits)
    }
}

fn identity_headers(token: &str) -> RelayResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(REFERER_URL));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    for (name, value) in CLIENT_IDENTITY {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    let mut cookie = HeaderValue::from_str(&format!("token={token}"))
        .map_err(|e| RelayError::Internal(format!("invalid upstream token: {e}")))?;
    cookie.set_sensitive(true);
    headers.insert(COOKIE, cookie);

    Ok(headers)
}
