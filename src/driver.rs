//! The batch conversion driver.
//!
//! Fans a list of [`ConversionRequest`]s out across a bounded pool of
//! workers, captures a per-source [`ConversionOutcome`], and aggregates
//! them into a [`BatchReport`]. Two invariants hold independently of the
//! scheduling mechanism:
//!
//! * **Bounded concurrency** — at most `max_workers` conversions run at
//!   once, enforced by `buffer_unordered`.
//! * **Input-order output** — each unit of work is tagged with its input
//!   index before dispatch; completion order is discarded when the tagged
//!   results are sorted back at collection time.
//!
//! A failing document never aborts its siblings: [`convert_one`] always
//! returns an outcome, converting every backend error (and the optional
//! per-request timeout) into a failed record. The only error that crosses
//! the `convert_batch` boundary is an invalid invocation.

use crate::backend::DocumentConverter;
use crate::config::BatchOptions;
use crate::error::{ConvertError, Doc2AnyError};
use crate::report::{BatchReport, ConversionOutcome};
use crate::request::ConversionRequest;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a single request, never propagating a per-document failure.
///
/// Applies the optional wall-clock budget: a conversion still running when
/// the budget expires becomes a failed outcome with a timeout error. The
/// reported duration is measured here, around the backend call and the
/// export, so it is meaningful for diagnostics even on failure.
pub async fn convert_one(
    converter: &Arc<dyn DocumentConverter>,
    request: &ConversionRequest,
    timeout: Option<std::time::Duration>,
) -> ConversionOutcome {
    let start = Instant::now();

    let conversion = converter.convert(&request.source, &request.options);
    let result = match timeout {
        Some(budget) => match tokio::time::timeout(budget, conversion).await {
            Ok(r) => r,
            Err(_) => Err(ConvertError::Timeout {
                secs: budget.as_secs(),
            }),
        },
        None => conversion.await,
    };

    match result {
        Ok(document) => {
            let content = request.export_format.export(document.as_ref());
            debug!(
                "Converted {} to {} ({} bytes)",
                request.source,
                request.export_format,
                content.len()
            );
            ConversionOutcome::succeeded(&request.source, content, start.elapsed())
        }
        Err(e) => {
            warn!("Conversion of {} failed: {}", request.source, e);
            ConversionOutcome::failed(&request.source, &e, start.elapsed())
        }
    }
}

/// Convert a batch of requests under a bounded worker pool.
///
/// # Arguments
/// * `converter` — the external conversion capability
/// * `requests`  — ordered list of documents; may be empty
/// * `options`   — worker bound, optional per-request timeout, progress
///
/// # Returns
/// `Ok(BatchReport)` with one outcome per request, in input order, even if
/// every document failed (check `failed_count`).
///
/// # Errors
/// `Err(Doc2AnyError::InvalidConfiguration)` iff `options.max_workers == 0`;
/// in that case zero conversions are attempted.
pub async fn convert_batch(
    converter: Arc<dyn DocumentConverter>,
    requests: Vec<ConversionRequest>,
    options: &BatchOptions,
) -> Result<BatchReport, Doc2AnyError> {
    if options.max_workers == 0 {
        return Err(Doc2AnyError::InvalidConfiguration(
            "max_workers must be >= 1, got 0".into(),
        ));
    }

    let total = requests.len();
    if total == 0 {
        return Ok(BatchReport::empty());
    }

    info!(
        "Starting batch of {} documents ({} workers)",
        total, options.max_workers
    );
    let started = Instant::now();

    if let Some(ref cb) = options.progress {
        cb.on_batch_start(total);
    }

    let mut tagged: Vec<(usize, ConversionOutcome)> = stream::iter(
        requests.iter().enumerate().map(|(idx, request)| {
            let converter = Arc::clone(&converter);
            let timeout = options.request_timeout;
            let progress = options.progress.clone();
            async move {
                if let Some(ref cb) = progress {
                    cb.on_source_start(idx + 1, total, &request.source);
                }
                let outcome = convert_one(&converter, request, timeout).await;
                if let Some(ref cb) = progress {
                    match outcome.content {
                        Some(ref content) => {
                            cb.on_source_complete(idx + 1, total, &request.source, content.len())
                        }
                        None => cb.on_source_error(
                            idx + 1,
                            total,
                            &request.source,
                            outcome.error.as_deref().unwrap_or("unknown error"),
                        ),
                    }
                }
                (idx, outcome)
            }
        }),
    )
    .buffer_unordered(options.max_workers)
    .collect()
    .await;

    // Completion order must not leak into the report.
    tagged.sort_unstable_by_key(|(idx, _)| *idx);
    let outcomes: Vec<ConversionOutcome> = tagged.into_iter().map(|(_, o)| o).collect();

    let report = BatchReport::from_outcomes(outcomes, started.elapsed());
    info!(
        "Batch complete: {} succeeded, {} failed, {}ms",
        report.succeeded_count, report.failed_count, report.total_duration_ms
    );

    if let Some(ref cb) = options.progress {
        cb.on_batch_complete(total, report.succeeded_count);
    }

    Ok(report)
}

/// Convert in-memory document bytes.
///
/// Writes `bytes` to a managed temporary file named after `filename` (the
/// extension is how the backend recognises the document type) and converts
/// that path. The temp directory is cleaned up on return or panic. This is
/// the entry point for the HTTP upload surface, where document data arrives
/// as a request body rather than a path.
pub async fn convert_bytes(
    converter: &Arc<dyn DocumentConverter>,
    bytes: &[u8],
    filename: &str,
    request: ConversionRequest,
    timeout: Option<std::time::Duration>,
) -> Result<ConversionOutcome, Doc2AnyError> {
    let temp_dir = tempfile::TempDir::new()
        .map_err(|e| Doc2AnyError::Internal(format!("tempfile: {e}")))?;
    let path = temp_dir.path().join(filename);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| Doc2AnyError::Internal(format!("tempfile write: {e}")))?;

    let staged = ConversionRequest {
        source: path.to_string_lossy().to_string(),
        ..request
    };
    let mut outcome = convert_one(converter, &staged, timeout).await;
    // Report the caller's name for the document, not the staging path.
    outcome.source = filename.to_string();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ParsedDocument;
    use crate::config::{ConvertOptions, ExportFormat};
    use crate::report::OutcomeStatus;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockDocument {
        body: String,
    }

    impl ParsedDocument for MockDocument {
        fn export_to_markdown(&self) -> String {
            format!("# {}", self.body)
        }
        fn export_to_json(&self) -> String {
            format!("{{\"text\": \"{}\"}}", self.body)
        }
        fn export_to_html(&self) -> String {
            format!("<p>{}</p>", self.body)
        }
        fn export_to_doctags(&self) -> String {
            format!("<text>{}</text>", self.body)
        }
    }

    /// Instrumented stand-in for the external converter: configurable
    /// failures and delays, plus a high-water mark of concurrently active
    /// calls.
    #[derive(Default)]
    struct MockConverter {
        fail: HashSet<String>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl MockConverter {
        fn failing(sources: &[&str]) -> Self {
            Self {
                fail: sources.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn with_delay(mut self, source: &str, delay: Duration) -> Self {
            self.delays.insert(source.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl DocumentConverter for MockConverter {
        async fn convert(
            &self,
            source: &str,
            _options: &ConvertOptions,
        ) -> Result<Box<dyn ParsedDocument>, ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(source)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;

            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail.contains(source) {
                Err(ConvertError::SourceNotFound {
                    source: source.to_string(),
                })
            } else {
                Ok(Box::new(MockDocument {
                    body: source.to_string(),
                }))
            }
        }
    }

    fn requests(sources: &[&str]) -> Vec<ConversionRequest> {
        sources
            .iter()
            .map(|s| ConversionRequest::new(*s, ExportFormat::Markdown))
            .collect()
    }

    fn workers(n: usize) -> BatchOptions {
        BatchOptions::builder().max_workers(n).build().unwrap()
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_report() {
        let converter: Arc<dyn DocumentConverter> = Arc::new(MockConverter::default());
        let report = convert_batch(converter, Vec::new(), &workers(4))
            .await
            .unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(report.succeeded_count, 0);
        assert_eq!(report.failed_count, 0);
    }

    #[tokio::test]
    async fn zero_workers_fails_before_any_work() {
        let mock = Arc::new(MockConverter::default());
        let converter: Arc<dyn DocumentConverter> = mock.clone();
        let options = BatchOptions {
            max_workers: 0,
            ..BatchOptions::default()
        };

        let result = convert_batch(converter, requests(&["a.pdf", "b.pdf"]), &options).await;
        assert!(matches!(
            result,
            Err(Doc2AnyError::InvalidConfiguration(_))
        ));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outcomes_match_input_order_under_concurrency() {
        // The first source is the slowest; its outcome must still come first.
        let mock = MockConverter::default()
            .with_delay("slow.pdf", Duration::from_millis(100));
        let converter: Arc<dyn DocumentConverter> = Arc::new(mock);

        let sources = ["slow.pdf", "b.docx", "c.pptx", "d.html"];
        let report = convert_batch(converter, requests(&sources), &workers(4))
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), sources.len());
        for (i, source) in sources.iter().enumerate() {
            assert_eq!(report.outcomes[i].source, *source);
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_max_workers() {
        let mut mock = MockConverter::default();
        for i in 0..8 {
            mock.delays
                .insert(format!("doc{i}.pdf"), Duration::from_millis(30));
        }
        let mock = Arc::new(mock);
        let converter: Arc<dyn DocumentConverter> = mock.clone();

        let sources: Vec<String> = (0..8).map(|i| format!("doc{i}.pdf")).collect();
        let reqs: Vec<ConversionRequest> = sources
            .iter()
            .map(|s| ConversionRequest::new(s.clone(), ExportFormat::Markdown))
            .collect();

        let report = convert_batch(converter, reqs, &workers(2)).await.unwrap();

        assert_eq!(report.succeeded_count, 8);
        assert!(
            mock.max_active.load(Ordering::SeqCst) <= 2,
            "observed {} concurrent conversions with max_workers = 2",
            mock.max_active.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn failures_are_isolated_to_their_outcome() {
        // Indices 1 and 3 are engineered to fail; the rest succeed.
        let mock = MockConverter::failing(&["bad1.pdf", "bad3.pdf"]);
        let converter: Arc<dyn DocumentConverter> = Arc::new(mock);

        let sources = ["a.pdf", "bad1.pdf", "c.pdf", "bad3.pdf", "e.pdf"];
        let report = convert_batch(converter, requests(&sources), &workers(3))
            .await
            .unwrap();

        assert_eq!(report.succeeded_count, 3);
        assert_eq!(report.failed_count, 2);
        assert_eq!(
            report.succeeded_count + report.failed_count,
            report.outcomes.len()
        );

        for (i, outcome) in report.outcomes.iter().enumerate() {
            if i == 1 || i == 3 {
                assert_eq!(outcome.status, OutcomeStatus::Failed);
                assert!(outcome.content.is_none());
                assert!(!outcome.error.as_deref().unwrap().is_empty());
            } else {
                assert_eq!(outcome.status, OutcomeStatus::Succeeded);
                assert!(outcome.error.is_none());
                assert!(!outcome.content.as_deref().unwrap().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn timeout_becomes_a_failed_outcome() {
        let mock = MockConverter::default()
            .with_delay("glacial.pdf", Duration::from_millis(500));
        let converter: Arc<dyn DocumentConverter> = Arc::new(mock);

        let options = BatchOptions::builder()
            .max_workers(2)
            .request_timeout(Duration::from_millis(40))
            .build()
            .unwrap();

        let report = convert_batch(
            converter,
            requests(&["quick.pdf", "glacial.pdf"]),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded_count, 1);
        assert_eq!(report.failed_count, 1);
        assert!(report.outcomes[0].is_success());
        assert!(report.outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn export_format_selects_representation() {
        let converter: Arc<dyn DocumentConverter> = Arc::new(MockConverter::default());
        let request = ConversionRequest::new("doc.pdf", ExportFormat::Html);

        let outcome = convert_one(&converter, &request, None).await;
        assert_eq!(outcome.content.as_deref(), Some("<p>doc.pdf</p>"));
    }

    #[tokio::test]
    async fn convert_one_records_duration() {
        let mock =
            MockConverter::default().with_delay("doc.pdf", Duration::from_millis(25));
        let converter: Arc<dyn DocumentConverter> = Arc::new(mock);
        let request = ConversionRequest::new("doc.pdf", ExportFormat::Markdown);

        let outcome = convert_one(&converter, &request, None).await;
        assert!(outcome.is_success());
        assert!(outcome.duration_ms >= 25);
    }

    #[tokio::test]
    async fn convert_bytes_reports_the_original_filename() {
        let converter: Arc<dyn DocumentConverter> = Arc::new(MockConverter::default());
        let request = ConversionRequest::new("ignored", ExportFormat::Markdown);

        let outcome = convert_bytes(&converter, b"%PDF-1.7", "upload.pdf", request, None)
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.source, "upload.pdf");
    }
}
