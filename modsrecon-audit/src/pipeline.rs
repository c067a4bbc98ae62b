//! Audit pipeline orchestrator
//!
//! A single producer walks the root directory on a blocking thread and
//! feeds a bounded queue. A fixed pool of workers drains it; each worker
//! resolves the node id, reads the legacy file, fetches the live document,
//! decodes both on a blocking thread, compares them and appends a report
//! row on mismatch.
//!
//! Per-object failures are logged and counted as skips. Only an
//! unenumerable root directory or a panicked task aborts the run. Rows are
//! written in completion order, not directory order.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modsrecon_common::config::AuditConfig;
use modsrecon_common::IdentifierRegistry;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::comparator;
use crate::decoder::{DecodedRecord, ModsDecoder};
use crate::error::{PipelineError, PipelineResult};
use crate::report::ReportWriter;
use crate::services::{
    build_http_client, FileScanner, HttpIdentifierResolver, IdentifierCache, IdentifierResolver,
    LiveDocument, LiveSource, ModsClient, ObjectFile, Resolution,
};

const PROGRESS_INTERVAL: usize = 100;

/// Why an object was left out of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No node id in the registry (or from remote resolution)
    Unresolved,
    /// Legacy file could not be read
    LocalRead,
    /// Live request failed before a status was received
    Fetch,
    /// Live platform answered with a non-success status
    Unavailable,
    /// Either document was not well-formed XML
    Decode,
    /// Mismatch found but the row could not be written
    ReportWrite,
}

/// Result of processing one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOutcome {
    Matched,
    Mismatched,
    Skipped(SkipReason),
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub discovered: usize,
    pub processed: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub skipped_unresolved: usize,
    pub skipped_local_read: usize,
    pub skipped_fetch: usize,
    pub skipped_unavailable: usize,
    pub skipped_decode: usize,
    pub write_failures: usize,
}

impl AuditSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_unresolved
            + self.skipped_local_read
            + self.skipped_fetch
            + self.skipped_unavailable
            + self.skipped_decode
            + self.write_failures
    }
}

#[derive(Default)]
struct Counters {
    processed: AtomicUsize,
    matched: AtomicUsize,
    mismatched: AtomicUsize,
    unresolved: AtomicUsize,
    local_read: AtomicUsize,
    fetch: AtomicUsize,
    unavailable: AtomicUsize,
    decode: AtomicUsize,
    report_write: AtomicUsize,
}

impl Counters {
    /// Record an outcome, returning the processed count so far
    fn record(&self, outcome: ObjectOutcome) -> usize {
        let counter = match outcome {
            ObjectOutcome::Matched => &self.matched,
            ObjectOutcome::Mismatched => &self.mismatched,
            ObjectOutcome::Skipped(SkipReason::Unresolved) => &self.unresolved,
            ObjectOutcome::Skipped(SkipReason::LocalRead) => &self.local_read,
            ObjectOutcome::Skipped(SkipReason::Fetch) => &self.fetch,
            ObjectOutcome::Skipped(SkipReason::Unavailable) => &self.unavailable,
            ObjectOutcome::Skipped(SkipReason::Decode) => &self.decode,
            ObjectOutcome::Skipped(SkipReason::ReportWrite) => &self.report_write,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn summary(&self, discovered: usize) -> AuditSummary {
        AuditSummary {
            discovered,
            processed: self.processed.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            mismatched: self.mismatched.load(Ordering::Relaxed),
            skipped_unresolved: self.unresolved.load(Ordering::Relaxed),
            skipped_local_read: self.local_read.load(Ordering::Relaxed),
            skipped_fetch: self.fetch.load(Ordering::Relaxed),
            skipped_unavailable: self.unavailable.load(Ordering::Relaxed),
            skipped_decode: self.decode.load(Ordering::Relaxed),
            write_failures: self.report_write.load(Ordering::Relaxed),
        }
    }
}

type SharedCache = IdentifierCache<Arc<dyn IdentifierResolver>>;

/// Audit pipeline
///
/// Holds the run-scoped state shared by all workers. Construct with
/// [`AuditPipeline::from_config`] for the live platform, or
/// [`AuditPipeline::new`] with any [`LiveSource`].
pub struct AuditPipeline {
    config: Arc<AuditConfig>,
    registry: Arc<IdentifierRegistry>,
    live: Arc<dyn LiveSource>,
    cache: Option<Arc<SharedCache>>,
    decoder: ModsDecoder,
}

impl AuditPipeline {
    pub fn new(
        config: AuditConfig,
        registry: IdentifierRegistry,
        live: Arc<dyn LiveSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            live,
            cache: None,
            decoder: ModsDecoder::new(),
        }
    }

    /// Resolve node ids missing from the registry through `resolver`
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentifierResolver>) -> Self {
        self.cache = Some(Arc::new(IdentifierCache::new(resolver)));
        self
    }

    /// Pipeline against the live platform described by `config`
    pub fn from_config(
        config: AuditConfig,
        registry: IdentifierRegistry,
    ) -> PipelineResult<Self> {
        let http_client = build_http_client(config.request_timeout)?;
        let live = ModsClient::with_client(
            http_client.clone(),
            config.base_url.clone(),
            config.format.clone(),
        );
        let resolver = config
            .resolve_remote
            .then(|| HttpIdentifierResolver::new(http_client, config.base_url.clone()));

        let mut pipeline = Self::new(config, registry, Arc::new(live));
        if let Some(resolver) = resolver {
            pipeline = pipeline.with_resolver(Arc::new(resolver));
        }
        Ok(pipeline)
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Run the audit to completion, appending mismatches to `report`
    pub async fn run<W>(&self, report: Arc<ReportWriter<W>>) -> PipelineResult<AuditSummary>
    where
        W: Write + Send + 'static,
    {
        let workers = self.config.workers.max(1);
        let (tx, rx) = mpsc::channel::<ObjectFile>(self.config.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        tracing::info!(
            root = %self.config.root_dir.display(),
            workers,
            queue_capacity = self.config.queue_capacity,
            columns = self.config.mapping.len(),
            "Starting audit"
        );

        let scanner = FileScanner::new(self.config.placeholder.clone());
        let root: PathBuf = self.config.root_dir.clone();
        let producer = tokio::task::spawn_blocking(move || {
            scanner.walk(&root, |file| tx.blocking_send(file).is_ok())
        });

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                config: Arc::clone(&self.config),
                registry: Arc::clone(&self.registry),
                live: Arc::clone(&self.live),
                cache: self.cache.clone(),
                decoder: self.decoder.clone(),
                report: Arc::clone(&report),
                counters: Arc::clone(&counters),
            };
            let rx = Arc::clone(&rx);
            pool.spawn(async move { worker.run(rx).await });
        }

        while let Some(joined) = pool.join_next().await {
            joined?;
        }
        let discovered = producer.await??;

        let summary = counters.summary(discovered);
        tracing::info!(
            discovered = summary.discovered,
            processed = summary.processed,
            mismatched = summary.mismatched,
            matched = summary.matched,
            skipped = summary.skipped(),
            "Audit complete"
        );
        if let Some(cache) = &self.cache {
            tracing::debug!(hits = cache.hits(), misses = cache.misses(), "Identifier cache");
        }

        Ok(summary)
    }
}

struct Worker<W: Write> {
    id: usize,
    config: Arc<AuditConfig>,
    registry: Arc<IdentifierRegistry>,
    live: Arc<dyn LiveSource>,
    cache: Option<Arc<SharedCache>>,
    decoder: ModsDecoder,
    report: Arc<ReportWriter<W>>,
    counters: Arc<Counters>,
}

impl<W: Write> Worker<W> {
    async fn run(self, queue: Arc<Mutex<mpsc::Receiver<ObjectFile>>>) {
        loop {
            let next = queue.lock().await.recv().await;
            let Some(file) = next else {
                break;
            };

            let outcome = self.process(&file).await;
            let current = self.counters.record(outcome);
            if current % PROGRESS_INTERVAL == 0 {
                tracing::info!(processed = current, "Audit progress");
            }
        }
        tracing::debug!(worker = self.id, "Worker finished");
    }

    async fn process(&self, file: &ObjectFile) -> ObjectOutcome {
        let pid = file.pid.as_str();

        let Some(nid) = self.node_id(pid).await else {
            tracing::warn!(pid, "No node id for object, skipping");
            return ObjectOutcome::Skipped(SkipReason::Unresolved);
        };
        tracing::info!(pid, nid = %nid, "Processing object");

        let legacy_bytes = match tokio::fs::read(&file.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(pid, path = %file.path.display(), error = %e, "Cannot read legacy file, skipping");
                return ObjectOutcome::Skipped(SkipReason::LocalRead);
            }
        };

        let live_bytes = match self.live.fetch(pid).await {
            Ok(LiveDocument::Found(bytes)) => bytes,
            Ok(LiveDocument::Unavailable(status)) => {
                tracing::warn!(pid, status, "Live document unavailable, skipping");
                return ObjectOutcome::Skipped(SkipReason::Unavailable);
            }
            Err(e) => {
                tracing::warn!(pid, error = %e, "Live fetch failed, skipping");
                return ObjectOutcome::Skipped(SkipReason::Fetch);
            }
        };

        let (legacy, current) =
            match decode_pair(self.decoder.clone(), legacy_bytes, live_bytes).await {
                Ok(pair) => pair,
                Err((side, error)) => {
                    tracing::warn!(pid, side, error = %error, "Decode failed, skipping");
                    return ObjectOutcome::Skipped(SkipReason::Decode);
                }
            };
        if !legacy.warnings.is_empty() || !current.warnings.is_empty() {
            tracing::debug!(
                pid,
                legacy_warnings = legacy.warnings.len(),
                live_warnings = current.warnings.len(),
                "Decoded with warnings"
            );
        }

        let reconciliation =
            comparator::compare(&nid, &legacy.record, &current.record, &self.config.mapping);
        let Some(row) = reconciliation.into_report_row() else {
            return ObjectOutcome::Matched;
        };

        match self.report.append(&row) {
            Ok(()) => ObjectOutcome::Mismatched,
            Err(e) => {
                tracing::error!(pid, nid = %nid, error = %e, "Failed to write report row");
                ObjectOutcome::Skipped(SkipReason::ReportWrite)
            }
        }
    }

    async fn node_id(&self, pid: &str) -> Option<String> {
        if let Some(nid) = self.registry.nid(pid) {
            return Some(nid.to_string());
        }

        let cache = self.cache.as_ref()?;
        match cache.resolve(pid).await {
            Ok(Resolution::Found(nid)) => Some(nid),
            Ok(Resolution::NotFound) => None,
            Err(e) => {
                tracing::warn!(pid, error = %e, "Node id resolution failed");
                None
            }
        }
    }
}

/// Decode the legacy and live documents off the async worker threads
///
/// On failure returns the side that failed (`legacy`, `live`, or `task` if
/// the blocking task itself died) with the error text.
async fn decode_pair(
    decoder: ModsDecoder,
    legacy: Vec<u8>,
    live: Vec<u8>,
) -> Result<(DecodedRecord, DecodedRecord), (&'static str, String)> {
    let decoded = tokio::task::spawn_blocking(move || -> Result<_, (&'static str, String)> {
        let legacy = decoder.decode(&legacy).map_err(|e| ("legacy", e.to_string()))?;
        let live = decoder.decode(&live).map_err(|e| ("live", e.to_string()))?;
        Ok((legacy, live))
    })
    .await;

    match decoded {
        Ok(result) => result,
        Err(e) => Err(("task", e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FetchError;
    use async_trait::async_trait;
    use modsrecon_common::mapping::FieldMapping;
    use modsrecon_common::Field;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct StaticSource {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl LiveSource for StaticSource {
        async fn fetch(&self, pid: &str) -> Result<LiveDocument, FetchError> {
            Ok(match self.documents.get(pid) {
                Some(doc) => LiveDocument::Found(doc.clone().into_bytes()),
                None => LiveDocument::Unavailable(404),
            })
        }
    }

    fn mods(title: &str) -> String {
        format!("<mods><titleInfo><title>{}</title></titleInfo></mods>", title)
    }

    fn setup(workers: usize) -> (TempDir, AuditPipeline) {
        let dir = TempDir::new().unwrap();
        let legacy = [
            ("a:1", "The Cat"),
            ("a:2", "The Dog"),
            ("a:3", "Birds"),
            ("a:4", "Fish"),
        ];
        let mut registry = IdentifierRegistry::default();
        for (i, (pid, title)) in legacy.iter().enumerate() {
            std::fs::write(dir.path().join(format!("{}.xml", pid)), mods(title)).unwrap();
            registry.insert(*pid, (i + 1).to_string());
        }
        std::fs::write(dir.path().join(".keep"), "").unwrap();
        std::fs::write(dir.path().join("a:5.xml"), mods("Unregistered")).unwrap();

        let documents = [
            ("a:1", mods("the cat")),
            ("a:2", mods("The Wolf")),
            ("a:3", "<mods><titleInfo>".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let mut config = AuditConfig::for_root(dir.path());
        config.workers = workers;
        config.queue_capacity = workers;
        config.mapping = FieldMapping::new(vec![("title", Field::Title)]).unwrap();

        let pipeline = AuditPipeline::new(config, registry, Arc::new(StaticSource { documents }));
        (dir, pipeline)
    }

    #[tokio::test]
    async fn test_run_counts_each_outcome() {
        let (_dir, pipeline) = setup(3);
        let report = Arc::new(ReportWriter::new(Vec::new(), &pipeline.config().mapping).unwrap());

        let summary = pipeline.run(Arc::clone(&report)).await.unwrap();

        assert_eq!(
            summary,
            AuditSummary {
                discovered: 5,
                processed: 5,
                matched: 1,
                mismatched: 1,
                skipped_unresolved: 1,
                skipped_local_read: 0,
                skipped_fetch: 0,
                skipped_unavailable: 1,
                skipped_decode: 1,
                write_failures: 0,
            }
        );

        drop(pipeline);
        let out = Arc::try_unwrap(report).ok().unwrap().into_inner().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "node_id,title\n2,The Dog\n");
    }

    #[tokio::test]
    async fn test_remote_resolution_fills_registry_gaps() {
        struct FixedResolver;

        #[async_trait]
        impl IdentifierResolver for FixedResolver {
            async fn resolve(
                &self,
                pid: &str,
            ) -> Result<Resolution, crate::services::ResolveError> {
                Ok(match pid {
                    "a:5" => Resolution::Found("500".to_string()),
                    _ => Resolution::NotFound,
                })
            }
        }

        let (_dir, pipeline) = setup(2);
        let pipeline = pipeline.with_resolver(Arc::new(FixedResolver));
        let report = Arc::new(ReportWriter::new(Vec::new(), &pipeline.config().mapping).unwrap());

        let summary = pipeline.run(report).await.unwrap();
        assert_eq!(summary.skipped_unresolved, 0);
        // a:5 resolves but has no live document
        assert_eq!(summary.skipped_unavailable, 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_decode_pair_reports_failing_side() {
        let decoder = ModsDecoder::new();
        let good = mods("The Cat").into_bytes();
        let bad = b"<mods><titleInfo>".to_vec();

        let (legacy, live) = decode_pair(decoder.clone(), good.clone(), mods("Dog").into_bytes())
            .await
            .unwrap();
        assert_eq!(legacy.record.values(Field::Title), ["The Cat".to_string()]);
        assert_eq!(live.record.values(Field::Title), ["Dog".to_string()]);

        let (side, _) = decode_pair(decoder.clone(), bad.clone(), good.clone()).await.unwrap_err();
        assert_eq!(side, "legacy");
        let (side, _) = decode_pair(decoder, good, bad).await.unwrap_err();
        assert_eq!(side, "live");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_run_on_single_threaded_runtime() {
        let (_dir, pipeline) = setup(4);
        let report = Arc::new(ReportWriter::new(Vec::new(), &pipeline.config().mapping).unwrap());

        let summary = pipeline.run(report).await.unwrap();
        assert_eq!(summary.processed, 5);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.mismatched, 1);
        assert_eq!(summary.skipped_decode, 1);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let config = AuditConfig::for_root("/nonexistent/modsrecon/root");
        let pipeline = AuditPipeline::new(
            config,
            IdentifierRegistry::default(),
            Arc::new(StaticSource {
                documents: HashMap::new(),
            }),
        );
        let report = Arc::new(ReportWriter::new(Vec::new(), &pipeline.config().mapping).unwrap());
        assert!(matches!(
            pipeline.run(report).await,
            Err(PipelineError::Scan(_))
        ));
    }
}
