//! The external-converter boundary.
//!
//! Everything this crate knows about document parsing is behind
//! [`DocumentConverter`]: given a source and pass-through options, return a
//! [`ParsedDocument`] or fail. The parsed document exposes one export
//! method per target representation; [`crate::ExportFormat::export`] is the
//! exhaustive switch over them. The driver, CLI, and HTTP surface all work
//! against these traits, so tests substitute an instrumented mock and the
//! production code plugs in the docling backend without either side
//! noticing.

use crate::config::ConvertOptions;
use crate::error::{ConvertError, Doc2AnyError};
use async_trait::async_trait;
use std::sync::Arc;

pub mod docling;

pub use docling::DoclingServeConverter;

/// The opaque, pre-existing document-understanding capability.
///
/// `convert` is potentially slow and I/O-bound (disk reads, network
/// fetches, the parser's own model pipeline). The driver only runs it,
/// bounds its concurrency, and captures its result or failure.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Parse one document from a local path or URL.
    async fn convert(
        &self,
        source: &str,
        options: &ConvertOptions,
    ) -> Result<Box<dyn ParsedDocument>, ConvertError>;
}

/// The backend's result object: a parsed document that can be exported to
/// each supported representation.
pub trait ParsedDocument: Send + Sync {
    fn export_to_markdown(&self) -> String;
    fn export_to_json(&self) -> String;
    fn export_to_html(&self) -> String;
    fn export_to_doctags(&self) -> String;
}

/// Check whether a source string is an HTTP/HTTPS URL (vs. a local path).
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Resolve the conversion backend, from most-specific to least-specific.
///
/// 1. **Explicit URL** — the caller named the backend endpoint (CLI flag,
///    server config).
/// 2. **`DOC2ANY_BACKEND_URL`** — the environment chose the endpoint
///    (Makefile, shell script, CI, container).
/// 3. **Default** — `http://localhost:5001`, the standard docling-serve
///    port, so `doc2any document.pdf` works with no configuration next to
///    a locally running backend.
///
/// Callers needing custom middleware construct their own
/// [`DocumentConverter`] and pass it to the driver directly instead.
pub fn resolve_converter(base_url: Option<&str>) -> Result<Arc<dyn DocumentConverter>, Doc2AnyError> {
    let url = match base_url {
        Some(u) => u.to_string(),
        None => match std::env::var("DOC2ANY_BACKEND_URL") {
            Ok(u) if !u.is_empty() => u,
            _ => "http://localhost:5001".to_string(),
        },
    };

    let converter = DoclingServeConverter::new(&url)?;
    Ok(Arc::new(converter))
}
