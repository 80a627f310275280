//! Writing exported content to an output directory.
//!
//! Output naming follows the original tool's convention: the source's file
//! stem plus the export format's extension, e.g. `report.pdf` converted to
//! Markdown lands at `<out_dir>/report.md`. URLs use their last path
//! segment. Writes are atomic (temp file + rename) so a crash mid-write
//! never leaves a partial file behind.

use crate::config::ExportFormat;
use crate::error::Doc2AnyError;
use crate::report::ConversionOutcome;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compute the output path for a source converted to `format`.
pub fn output_path_for(out_dir: &Path, source: &str, format: ExportFormat) -> PathBuf {
    let stem = source_stem(source);
    out_dir.join(format!("{}.{}", stem, format.extension()))
}

/// Derive a file stem from a source path or URL.
fn source_stem(source: &str) -> String {
    let last_segment = source
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source);
    let stem = match last_segment.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => last_segment,
    };
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.to_string()
    }
}

/// Write a successful outcome's content under `out_dir`, atomically.
///
/// Creates `out_dir` on demand. Failed outcomes are not written; callers
/// skip them (the report already carries the error).
pub async fn write_outcome(
    out_dir: &Path,
    outcome: &ConversionOutcome,
    format: ExportFormat,
) -> Result<PathBuf, Doc2AnyError> {
    let content = outcome.content.as_deref().unwrap_or_default();
    let path = output_path_for(out_dir, &outcome.source, format);

    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| Doc2AnyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    // Atomic write: write to temp, then rename.
    let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| Doc2AnyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| Doc2AnyError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(path)
}
