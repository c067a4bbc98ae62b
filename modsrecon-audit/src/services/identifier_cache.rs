//! Identifier cache
//!
//! Memoizes legacy pid → node id lookups against the live platform for the
//! duration of one run. The cache is owned by the pipeline and shared with
//! its workers through an `Arc`; entries, including "not found", are never
//! invalidated. Failed lookups are not cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

/// Identifier resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0} for {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Outcome of resolving one pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
}

impl Resolution {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Resolution::Found(nid) => Some(nid),
            Resolution::NotFound => None,
        }
    }
}

/// Remote pid → node id lookup
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    async fn resolve(&self, pid: &str) -> Result<Resolution, ResolveError>;
}

#[async_trait]
impl<T: IdentifierResolver + ?Sized> IdentifierResolver for std::sync::Arc<T> {
    async fn resolve(&self, pid: &str) -> Result<Resolution, ResolveError> {
        (**self).resolve(pid).await
    }
}

/// Resolver backed by the platform's JSON serialization
///
/// `GET {base_url}/{pid}?_format=json`, node id read from `nid[0].value`.
pub struct HttpIdentifierResolver {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpIdentifierResolver {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentifierResolver for HttpIdentifierResolver {
    async fn resolve(&self, pid: &str) -> Result<Resolution, ResolveError> {
        let url = format!("{}/{}?_format=json", self.base_url, pid);
        tracing::debug!(pid = %pid, url = %url, "Resolving node id");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Resolution::NotFound);
        }
        if !status.is_success() {
            return Err(ResolveError::ApiError(status.as_u16(), pid.to_string()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ResolveError::ParseError(e.to_string()))?;

        parse_node_id(&body)
            .map(Resolution::Found)
            .ok_or_else(|| ResolveError::ParseError(format!("no nid[0].value for {}", pid)))
    }
}

/// Read `nid[0].value`, accepting either a number or a string
pub fn parse_node_id(body: &Value) -> Option<String> {
    match body.get("nid")?.get(0)?.get("value")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Run-scoped memoizing wrapper around a resolver
pub struct IdentifierCache<R> {
    resolver: R,
    entries: Mutex<HashMap<String, Resolution>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<R: IdentifierResolver> IdentifierCache<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Cached lookup; the resolver runs outside the lock
    pub async fn resolve(&self, pid: &str) -> Result<Resolution, ResolveError> {
        if let Some(cached) = self.entries.lock().await.get(pid) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolution = self.resolver.resolve(pid).await?;

        // First writer wins; a concurrent miss for the same pid keeps its entry
        let mut entries = self.entries.lock().await;
        Ok(entries
            .entry(pid.to_string())
            .or_insert(resolution)
            .clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}
