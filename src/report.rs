//! Per-document outcomes and the aggregated batch report.
//!
//! An outcome is a success-or-failure record, never an exception: the
//! driver converts every per-document error into a failed
//! [`ConversionOutcome`] so callers can inspect partial success instead of
//! losing a whole batch to one bad document. [`BatchReport`] aggregates the
//! outcomes in input order with derived counts.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether a single conversion succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// The result of converting exactly one request.
///
/// Invariant: `content` is populated iff `status == Succeeded`, `error` iff
/// `status == Failed`. Use the [`ConversionOutcome::succeeded`] and
/// [`ConversionOutcome::failed`] constructors; they are the only places the
/// invariant is established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Echo of the request's source, for correlating results back.
    pub source: String,

    /// Success or failure.
    pub status: OutcomeStatus,

    /// Exported content. Present iff `status == Succeeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Human-readable failure description. Present iff `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock time spent on this conversion.
    pub duration_ms: u64,
}

impl ConversionOutcome {
    /// A successful outcome carrying the exported content.
    pub fn succeeded(source: impl Into<String>, content: String, duration: Duration) -> Self {
        Self {
            source: source.into(),
            status: OutcomeStatus::Succeeded,
            content: Some(content),
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// A failed outcome carrying the error description.
    pub fn failed(source: impl Into<String>, error: &ConvertError, duration: Duration) -> Self {
        Self {
            source: source.into(),
            status: OutcomeStatus::Failed,
            content: None,
            error: Some(error.to_string()),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// True iff the conversion succeeded.
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

/// Aggregate over one batch invocation.
///
/// `outcomes` is strictly in the same order as the input request list,
/// regardless of completion order under concurrency. Created fresh per
/// batch; immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per input request, in input order.
    pub outcomes: Vec<ConversionOutcome>,

    /// Number of outcomes with `status == Succeeded`.
    pub succeeded_count: usize,

    /// Number of outcomes with `status == Failed`.
    pub failed_count: usize,

    /// Wall-clock time for the whole batch. Work overlaps under
    /// concurrency, so this is not the sum of individual durations.
    pub total_duration_ms: u64,
}

impl BatchReport {
    /// Build a report from collected outcomes, deriving the counts.
    pub fn from_outcomes(outcomes: Vec<ConversionOutcome>, total_duration: Duration) -> Self {
        let succeeded_count = outcomes.iter().filter(|o| o.is_success()).count();
        let failed_count = outcomes.len() - succeeded_count;
        Self {
            outcomes,
            succeeded_count,
            failed_count,
            total_duration_ms: total_duration.as_millis() as u64,
        }
    }

    /// An empty report for an empty batch.
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            succeeded_count: 0,
            failed_count: 0,
            total_duration_ms: 0,
        }
    }

    /// True iff every document in the batch succeeded.
    pub fn is_all_success(&self) -> bool {
        self.failed_count == 0
    }
}
