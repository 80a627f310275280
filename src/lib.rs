//! # doc2any
//!
//! Convert documents — PDF, DOCX, PPTX, HTML, images — to Markdown, JSON,
//! HTML, or DocTags by orchestrating a Docling parsing backend.
//!
//! ## Why this crate?
//!
//! Document understanding is a solved-elsewhere problem: the Docling
//! parser already handles layout analysis, OCR, and table structure. What
//! it does not give you is a way to push a folder of mixed documents
//! through it reliably — bounded concurrency, per-document failure
//! isolation, an ordered report at the end. This crate is that layer, and
//! nothing more: no parsing logic lives here.
//!
//! ## Pipeline Overview
//!
//! ```text
//! sources (paths / URLs)
//!  │
//!  ├─ 1. Request  one ConversionRequest per document
//!  ├─ 2. Dispatch bounded worker pool (buffer_unordered, max_workers)
//!  ├─ 3. Convert  backend call per document, failures captured locally
//!  ├─ 4. Export   markdown / json / html / doctags per request
//!  └─ 5. Report   outcomes reordered to input order + summary counts
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2any::{convert_batch, resolve_converter, BatchOptions, ConversionRequest, ExportFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Backend endpoint from DOC2ANY_BACKEND_URL, else localhost:5001
//!     let converter = resolve_converter(None)?;
//!     let requests = vec![
//!         ConversionRequest::new("paper.pdf", ExportFormat::Markdown),
//!         ConversionRequest::new("https://arxiv.org/pdf/2408.09869", ExportFormat::Markdown),
//!     ];
//!     let options = BatchOptions::builder().max_workers(4).build()?;
//!
//!     let report = convert_batch(converter, requests, &options).await?;
//!     println!("{} succeeded, {} failed", report.succeeded_count, report.failed_count);
//!     for outcome in &report.outcomes {
//!         if let Some(content) = &outcome.content {
//!             println!("--- {} ---\n{}", outcome.source, content);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `doc2any` binary (clap + anyhow + indicatif) |
//! | `server` | on      | Enables the `doc2any-api` binary (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! doc2any = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod progress;
pub mod report;
pub mod request;
#[cfg(feature = "server")]
pub mod server;
pub mod sink;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{is_url, resolve_converter, DoclingServeConverter, DocumentConverter, ParsedDocument};
pub use config::{BatchOptions, BatchOptionsBuilder, ConvertOptions, ConvertOptionsBuilder, ExportFormat};
pub use driver::{convert_batch, convert_bytes, convert_one};
pub use error::{ConvertError, Doc2AnyError};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{BatchReport, ConversionOutcome, OutcomeStatus};
pub use request::ConversionRequest;
pub use stream::{convert_stream, OutcomeStream};
