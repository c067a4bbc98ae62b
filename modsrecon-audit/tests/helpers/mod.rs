//! Test Helper Utilities
//!
//! Shared utilities for testing modsrecon-audit:
//! - an in-process stand-in for the live platform
//! - fixture directories of legacy MODS files

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;

use modsrecon_common::IdentifierRegistry;

/// Objects the fake platform serves
#[derive(Default)]
pub struct PlatformData {
    /// pid → MODS body for `?_format=mods`
    pub documents: HashMap<String, String>,
    /// pid → node id for `?_format=json`
    pub nids: HashMap<String, u64>,
}

struct PlatformState {
    data: PlatformData,
    mods_requests: AtomicUsize,
    json_requests: AtomicUsize,
}

#[derive(Deserialize)]
struct FormatQuery {
    #[serde(rename = "_format")]
    format: Option<String>,
}

/// Running fake platform
pub struct LivePlatform {
    pub base_url: String,
    state: Arc<PlatformState>,
    server: tokio::task::JoinHandle<()>,
}

impl LivePlatform {
    pub async fn spawn(data: PlatformData) -> Self {
        let state = Arc::new(PlatformState {
            data,
            mods_requests: AtomicUsize::new(0),
            json_requests: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/islandora/object/:pid", get(object))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/islandora/object", addr),
            state,
            server,
        }
    }

    pub fn mods_requests(&self) -> usize {
        self.state.mods_requests.load(Ordering::SeqCst)
    }

    pub fn json_requests(&self) -> usize {
        self.state.json_requests.load(Ordering::SeqCst)
    }
}

impl Drop for LivePlatform {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn object(
    State(state): State<Arc<PlatformState>>,
    UrlPath(pid): UrlPath<String>,
    Query(query): Query<FormatQuery>,
) -> Response {
    match query.format.as_deref() {
        Some("mods") => {
            state.mods_requests.fetch_add(1, Ordering::SeqCst);
            match state.data.documents.get(&pid) {
                Some(doc) => ([(header::CONTENT_TYPE, "application/xml")], doc.clone()).into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        Some("json") => {
            state.json_requests.fetch_add(1, Ordering::SeqCst);
            match state.data.nids.get(&pid) {
                Some(nid) => Json(json!({ "nid": [{ "value": nid }] })).into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            }
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Wrap MODS body elements in a namespaced root
pub fn mods(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mods xmlns="http://www.loc.gov/mods/v3" xmlns:xlink="http://www.w3.org/1999/xlink">{}</mods>"#,
        body
    )
}

/// Write `{pid}.xml` files plus the `.keep` placeholder into a fresh dir
pub fn legacy_dir(files: &[(&str, String)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (pid, body) in files {
        std::fs::write(dir.path().join(format!("{}.xml", pid)), body).unwrap();
    }
    std::fs::write(dir.path().join(".keep"), "").unwrap();
    dir
}

/// Registry mapping each pid to the given node id
pub fn registry(entries: &[(&str, &str)]) -> IdentifierRegistry {
    let mut registry = IdentifierRegistry::default();
    for (pid, nid) in entries {
        registry.insert(*pid, *nid);
    }
    registry
}

/// Report rows (header excluded) as column → value maps
pub fn read_report(path: &Path) -> Vec<HashMap<String, String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().clone();
    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            header
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect()
        })
        .collect()
}
