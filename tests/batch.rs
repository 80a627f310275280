//! Integration tests for the batch driver through the public API.
//!
//! A consumer-side mock converter implements the public traits, which also
//! pins down that the backend boundary is implementable from outside the
//! crate. No network, no real backend.

use async_trait::async_trait;
use doc2any::{
    convert_batch, convert_stream, BatchOptions, ConvertError, ConvertOptions, ConversionRequest,
    Doc2AnyError, DocumentConverter, ExportFormat, OutcomeStatus, ParsedDocument,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct StaticDocument {
    text: String,
}

impl ParsedDocument for StaticDocument {
    fn export_to_markdown(&self) -> String {
        format!("# {}", self.text)
    }
    fn export_to_json(&self) -> String {
        format!("{{\"text\": \"{}\"}}", self.text)
    }
    fn export_to_html(&self) -> String {
        format!("<p>{}</p>", self.text)
    }
    fn export_to_doctags(&self) -> String {
        format!("<text>{}</text>", self.text)
    }
}

/// Converter that fails any source containing "missing", sleeps a little
/// to let conversions overlap, and tracks the concurrency high-water mark.
#[derive(Default)]
struct FakeBackend {
    active: AtomicUsize,
    max_active: AtomicUsize,
}

#[async_trait]
impl DocumentConverter for FakeBackend {
    async fn convert(
        &self,
        source: &str,
        _options: &ConvertOptions,
    ) -> Result<Box<dyn ParsedDocument>, ConvertError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if source.contains("missing") {
            return Err(ConvertError::SourceNotFound {
                source: source.to_string(),
            });
        }
        Ok(Box::new(StaticDocument {
            text: source.to_string(),
        }))
    }
}

fn requests(sources: &[&str]) -> Vec<ConversionRequest> {
    sources
        .iter()
        .map(|s| ConversionRequest::new(*s, ExportFormat::Markdown))
        .collect()
}

#[tokio::test]
async fn report_has_one_outcome_per_request_in_input_order() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let sources = ["a.pdf", "missing.pdf", "c.docx", "d.pptx"];
    let options = BatchOptions::builder().max_workers(4).build().unwrap();

    let report = convert_batch(converter, requests(&sources), &options)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), sources.len());
    for (i, source) in sources.iter().enumerate() {
        assert_eq!(report.outcomes[i].source, *source);
    }
    assert_eq!(report.succeeded_count + report.failed_count, sources.len());
}

#[tokio::test]
async fn content_and_error_are_mutually_exclusive() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let options = BatchOptions::default();

    let report = convert_batch(
        converter,
        requests(&["fine.pdf", "missing.pdf"]),
        &options,
    )
    .await
    .unwrap();

    for outcome in &report.outcomes {
        match outcome.status {
            OutcomeStatus::Succeeded => {
                assert!(outcome.content.is_some());
                assert!(outcome.error.is_none());
            }
            OutcomeStatus::Failed => {
                assert!(outcome.content.is_none());
                assert!(outcome.error.is_some());
            }
        }
    }
}

#[tokio::test]
async fn bounded_concurrency_is_respected() {
    let backend = Arc::new(FakeBackend::default());
    let converter: Arc<dyn DocumentConverter> = backend.clone();
    let sources: Vec<String> = (0..12).map(|i| format!("doc{i}.pdf")).collect();
    let reqs: Vec<ConversionRequest> = sources
        .iter()
        .map(|s| ConversionRequest::new(s.clone(), ExportFormat::Markdown))
        .collect();

    let options = BatchOptions::builder().max_workers(3).build().unwrap();
    let report = convert_batch(converter, reqs, &options).await.unwrap();

    assert_eq!(report.succeeded_count, 12);
    assert!(backend.max_active.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn empty_batch_is_not_an_error() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let options = BatchOptions::builder().max_workers(4).build().unwrap();

    let report = convert_batch(converter, Vec::new(), &options).await.unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.succeeded_count, 0);
    assert_eq!(report.failed_count, 0);
}

#[tokio::test]
async fn zero_workers_is_a_configuration_error() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let options = BatchOptions {
        max_workers: 0,
        ..BatchOptions::default()
    };

    let result = convert_batch(converter, requests(&["a.pdf"]), &options).await;
    assert!(matches!(result, Err(Doc2AnyError::InvalidConfiguration(_))));
}

#[tokio::test]
async fn report_round_trips_through_json() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let options = BatchOptions::default();

    let report = convert_batch(converter, requests(&["a.pdf", "missing.pdf"]), &options)
        .await
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let parsed: doc2any::BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.succeeded_count, report.succeeded_count);
    assert_eq!(parsed.failed_count, report.failed_count);
    assert_eq!(parsed.outcomes.len(), report.outcomes.len());
}

#[tokio::test]
async fn stream_yields_every_outcome_exactly_once() {
    let converter: Arc<dyn DocumentConverter> = Arc::new(FakeBackend::default());
    let sources = ["a.pdf", "b.pdf", "missing.pdf"];
    let options = BatchOptions::builder().max_workers(2).build().unwrap();

    let stream = convert_stream(converter, requests(&sources), &options).unwrap();
    let mut tagged: Vec<(usize, doc2any::ConversionOutcome)> = stream.collect().await;

    assert_eq!(tagged.len(), sources.len());
    tagged.sort_unstable_by_key(|(idx, _)| *idx);
    for (i, source) in sources.iter().enumerate() {
        assert_eq!(tagged[i].0, i);
        assert_eq!(tagged[i].1.source, *source);
    }
}
