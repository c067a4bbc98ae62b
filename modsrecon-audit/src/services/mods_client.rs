//! Live platform MODS client
//!
//! Fetches the current-side MODS document for an object:
//! `GET {base_url}/{pid}?_format={format}`. A non-success status is not an
//! error, it is reported as [`LiveDocument::Unavailable`] so the pipeline can
//! skip the object. There is no retry and no rate limiting.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const USER_AGENT: &str = concat!("modsrecon/", env!("CARGO_PKG_VERSION"));

/// Live fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Client build error: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Body read error: {0}")]
    BodyError(String),
}

/// Result of fetching one live document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveDocument {
    /// Success status; raw body
    Found(Vec<u8>),
    /// Any non-success status
    Unavailable(u16),
}

/// Source of current-side documents
#[async_trait]
pub trait LiveSource: Send + Sync {
    async fn fetch(&self, pid: &str) -> Result<LiveDocument, FetchError>;
}

/// Build the shared HTTP client
///
/// `timeout` of `None` leaves requests unbounded.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| FetchError::ClientBuild(e.to_string()))
}

/// HTTP client for the live platform
#[derive(Clone)]
pub struct ModsClient {
    http_client: reqwest::Client,
    base_url: String,
    format: String,
}

impl ModsClient {
    pub fn new(
        base_url: impl Into<String>,
        format: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        Ok(Self::with_client(build_http_client(timeout)?, base_url, format))
    }

    /// Reuse an existing client (shared connection pool)
    pub fn with_client(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            format: format.into(),
        }
    }

    /// Object URL for `pid`
    pub fn url_for(&self, pid: &str) -> String {
        format!("{}/{}?_format={}", self.base_url, pid, self.format)
    }
}

#[async_trait]
impl LiveSource for ModsClient {
    async fn fetch(&self, pid: &str) -> Result<LiveDocument, FetchError> {
        let url = self.url_for(pid);
        tracing::debug!(pid = %pid, url = %url, "Fetching live document");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(LiveDocument::Unavailable(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::BodyError(e.to_string()))?;

        Ok(LiveDocument::Found(body.to_vec()))
    }
}
