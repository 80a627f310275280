//! One unit of conversion work.

use crate::config::{ConvertOptions, ExportFormat};
use serde::{Deserialize, Serialize};

/// A single document to convert: source, target format, and backend options.
///
/// Constructed by the caller, consumed once by the driver. The `source` is
/// an opaque identifier — a local path or an HTTP/HTTPS URL — that the
/// driver passes through without validation; only the backend decides
/// whether it can be opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Local path or URL of the document.
    pub source: String,

    /// Representation to export the parsed document to.
    pub export_format: ExportFormat,

    /// Options forwarded verbatim to the parsing backend.
    pub options: ConvertOptions,
}

impl ConversionRequest {
    /// Request with default options and the given target format.
    pub fn new(source: impl Into<String>, export_format: ExportFormat) -> Self {
        Self {
            source: source.into(),
            export_format,
            options: ConvertOptions::default(),
        }
    }

    /// Replace the backend options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_options() {
        let req = ConversionRequest::new("paper.pdf", ExportFormat::Markdown);
        assert_eq!(req.source, "paper.pdf");
        assert!(!req.options.ocr_enabled);
        assert!(req.options.table_structure_enabled);
    }

    #[test]
    fn with_options_replaces() {
        let opts = ConvertOptions::builder().ocr_enabled(true).build();
        let req = ConversionRequest::new("scan.png", ExportFormat::Html).with_options(opts);
        assert!(req.options.ocr_enabled);
    }
}
