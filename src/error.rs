//! Error types for the doc2any library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2AnyError`] — **Fatal**: the call itself is malformed or the
//!   environment is broken (zero workers requested, backend endpoint
//!   unusable, output file unwritable). Returned as `Err(Doc2AnyError)`
//!   from the top-level entry points before any conversion work starts.
//!
//! * [`ConvertError`] — **Non-fatal**: a single document could not be
//!   converted (missing file, dead URL, unsupported format, backend error,
//!   timeout). Captured inside the corresponding
//!   [`crate::report::ConversionOutcome`] so the rest of the batch keeps
//!   running.
//!
//! The separation is the contract: callers can always distinguish "my batch
//! call was malformed" from "some of my documents failed". The former is a
//! caller bug; the latter is the common case and must be handled gracefully.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2any library.
///
/// Per-document failures use [`ConvertError`] and are stored in
/// [`crate::report::ConversionOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Doc2AnyError {
    /// The driver was invoked with invalid settings; no work was attempted.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The conversion backend could not be constructed.
    #[error("Conversion backend unavailable: {detail}\nSet DOC2ANY_BACKEND_URL or pass --backend-url.")]
    BackendUnavailable { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error scoped to a single document.
///
/// Stored as the `error` text of a failed
/// [`crate::report::ConversionOutcome`]. The batch continues regardless of
/// how many of these occur.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ConvertError {
    /// Local source path does not exist or is unreadable.
    SourceNotFound { source: String },

    /// The source URL could not be fetched by the backend.
    FetchFailed { url: String, reason: String },

    /// The backend does not understand this document type.
    UnsupportedFormat { source: String, detail: String },

    /// The backend accepted the document but conversion failed.
    Backend { detail: String },

    /// The conversion exceeded the caller-configured time budget.
    Timeout { secs: u64 },
}

// `Display`/`Error` are implemented by hand rather than via `thiserror`'s
// derive because two variants carry a plain data field named `source`
// (the document path/URL). `thiserror` unconditionally treats any field
// named `source` as the underlying error source and requires it to impl
// `std::error::Error`, which `String` does not. These variants have no
// underlying error source, so `Error::source` correctly returns `None`.
impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::SourceNotFound { source } => {
                write!(f, "Source not found: '{source}'")
            }
            ConvertError::FetchFailed { url, reason } => {
                write!(f, "Failed to fetch '{url}': {reason}")
            }
            ConvertError::UnsupportedFormat { source, detail } => {
                write!(f, "Unsupported document format for '{source}': {detail}")
            }
            ConvertError::Backend { detail } => {
                write!(f, "Conversion failed: {detail}")
            }
            ConvertError::Timeout { secs } => {
                write!(f, "Conversion timed out after {secs}s")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_display() {
        let e = Doc2AnyError::InvalidConfiguration("max_workers must be >= 1, got 0".into());
        assert!(e.to_string().contains("max_workers"));
    }

    #[test]
    fn source_not_found_display() {
        let e = ConvertError::SourceNotFound {
            source: "/tmp/missing.pdf".into(),
        };
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }

    #[test]
    fn timeout_display() {
        let e = ConvertError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn fetch_failed_display() {
        let e = ConvertError::FetchFailed {
            url: "https://example.com/doc.pdf".into(),
            reason: "HTTP 404".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("example.com"));
        assert!(msg.contains("404"));
    }
}
