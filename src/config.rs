//! Configuration types for document conversion.
//!
//! Two small records control everything: [`ConvertOptions`] is the
//! pass-through configuration handed verbatim to the parsing backend for
//! each document, and [`BatchOptions`] holds the knobs of the batch driver
//! itself. Keeping them separate mirrors the boundary between "what the
//! backend does to one document" and "how this crate schedules many".
//!
//! # Design choice: builder over constructor
//! Both records are built via builders so callers set only what they care
//! about and rely on documented defaults for the rest. [`BatchOptions`]
//! validation happens in `build()` *and* again in the driver, because the
//! fields are public and a caller can construct the struct directly.

use crate::backend::ParsedDocument;
use crate::error::Doc2AnyError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Target representation a parsed document is exported to.
///
/// A closed enum in place of the original's reflective per-format dispatch:
/// [`ExportFormat::export`] is the single exhaustive switch mapping each
/// variant to the corresponding export call on the backend's result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// GitHub-flavoured Markdown. (default)
    #[default]
    Markdown,
    /// The backend's lossless JSON document model.
    Json,
    /// Standalone HTML.
    Html,
    /// DocTags, the backend's compact layout-aware markup.
    Doctags,
}

impl ExportFormat {
    /// Wire name understood by the docling backend (`to_formats` values).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Doctags => "doctags",
        }
    }

    /// File extension used when writing exported content to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Doctags => "doctags",
        }
    }

    /// Export a parsed document in this format.
    pub fn export(&self, doc: &dyn ParsedDocument) -> String {
        match self {
            ExportFormat::Markdown => doc.export_to_markdown(),
            ExportFormat::Json => doc.export_to_json(),
            ExportFormat::Html => doc.export_to_html(),
            ExportFormat::Doctags => doc.export_to_doctags(),
        }
    }

    /// All formats, in declaration order.
    pub fn all() -> [ExportFormat; 4] {
        [
            ExportFormat::Markdown,
            ExportFormat::Json,
            ExportFormat::Html,
            ExportFormat::Doctags,
        ]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Doctags => "doctags",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Doc2AnyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            "doctags" => Ok(ExportFormat::Doctags),
            other => Err(Doc2AnyError::InvalidConfiguration(format!(
                "Unknown export format '{other}' (expected markdown, json, html or doctags)"
            ))),
        }
    }
}

/// Per-document options passed through unmodified to the parsing backend.
///
/// The driver never inspects these; they are shared read-only across
/// workers. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Run optical text recognition on image-bearing pages. Default: false.
    ///
    /// OCR multiplies backend processing time per page; leave it off unless
    /// the inputs are scans or photographs.
    pub ocr_enabled: bool,

    /// Detect and structure tables. Default: true.
    pub table_structure_enabled: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ocr_enabled: false,
            table_structure_enabled: true,
        }
    }
}

impl ConvertOptions {
    /// Create a new builder for `ConvertOptions`.
    pub fn builder() -> ConvertOptionsBuilder {
        ConvertOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ConvertOptions`].
#[derive(Debug)]
pub struct ConvertOptionsBuilder {
    options: ConvertOptions,
}

impl ConvertOptionsBuilder {
    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.options.ocr_enabled = v;
        self
    }

    pub fn table_structure_enabled(mut self, v: bool) -> Self {
        self.options.table_structure_enabled = v;
        self
    }

    pub fn build(self) -> ConvertOptions {
        self.options
    }
}

/// Settings of one batch-driver invocation.
///
/// Built via [`BatchOptions::builder()`] or [`BatchOptions::default()`].
///
/// # Example
/// ```rust
/// use doc2any::BatchOptions;
/// use std::time::Duration;
///
/// let options = BatchOptions::builder()
///     .max_workers(8)
///     .request_timeout(Duration::from_secs(120))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchOptions {
    /// Upper bound on conversions running concurrently. Default: 4.
    ///
    /// Conversions are backend-bound (disk, network, the parser's own
    /// pipeline), not CPU-bound in this process, so the bound exists to
    /// protect the backend rather than the local machine. Must be >= 1;
    /// the driver rejects 0 before any work is scheduled.
    pub max_workers: usize,

    /// Optional wall-clock budget per request. Default: none.
    ///
    /// A conversion that exceeds the budget becomes a failed outcome with a
    /// timeout error; it never aborts its siblings.
    pub request_timeout: Option<Duration>,

    /// Progress callback receiving per-source events. Default: none.
    pub progress: Option<ProgressCallback>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            request_timeout: None,
            progress: None,
        }
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("max_workers", &self.max_workers)
            .field("request_timeout", &self.request_timeout)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn BatchProgressCallback>"))
            .finish()
    }
}

impl BatchOptions {
    /// Create a new builder for `BatchOptions`.
    pub fn builder() -> BatchOptionsBuilder {
        BatchOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`BatchOptions`].
#[derive(Debug)]
pub struct BatchOptionsBuilder {
    options: BatchOptions,
}

impl BatchOptionsBuilder {
    pub fn max_workers(mut self, n: usize) -> Self {
        self.options.max_workers = n;
        self
    }

    pub fn request_timeout(mut self, budget: Duration) -> Self {
        self.options.request_timeout = Some(budget);
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.options.progress = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<BatchOptions, Doc2AnyError> {
        if self.options.max_workers == 0 {
            return Err(Doc2AnyError::InvalidConfiguration(
                "max_workers must be >= 1, got 0".into(),
            ));
        }
        Ok(self.options)
    }
}
