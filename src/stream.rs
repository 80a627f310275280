//! Streaming conversion API: emit outcomes as they complete.
//!
//! ## Why stream?
//!
//! Large batches take minutes. A stream-based API lets callers display
//! partial results immediately or write outcomes to disk incrementally
//! instead of buffering the whole report in memory.
//!
//! Unlike the eager [`crate::driver::convert_batch`], which reorders into
//! input order before returning, [`convert_stream`] yields each outcome the
//! moment it is ready, tagged with the index of the request that produced
//! it. A slow document therefore never delays delivery of its faster
//! siblings; reordering is strictly the collector's concern.

use crate::backend::DocumentConverter;
use crate::config::BatchOptions;
use crate::driver::convert_one;
use crate::error::Doc2AnyError;
use crate::report::ConversionOutcome;
use crate::request::ConversionRequest;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of index-tagged outcomes, in completion order.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = (usize, ConversionOutcome)> + Send>>;

/// Convert a batch of requests, streaming outcomes as they are ready.
///
/// The index tag is the request's position in the input list; collect the
/// pairs into an index-addressed buffer to recover input order.
///
/// # Errors
/// `Err(Doc2AnyError::InvalidConfiguration)` iff `options.max_workers == 0`;
/// per-document failures arrive as failed outcomes on the stream.
pub fn convert_stream(
    converter: Arc<dyn DocumentConverter>,
    requests: Vec<ConversionRequest>,
    options: &BatchOptions,
) -> Result<OutcomeStream, Doc2AnyError> {
    if options.max_workers == 0 {
        return Err(Doc2AnyError::InvalidConfiguration(
            "max_workers must be >= 1, got 0".into(),
        ));
    }

    info!(
        "Starting streaming batch of {} documents ({} workers)",
        requests.len(),
        options.max_workers
    );

    let timeout = options.request_timeout;
    let s = stream::iter(requests.into_iter().enumerate().map(move |(idx, request)| {
        let converter = Arc::clone(&converter);
        async move {
            let outcome = convert_one(&converter, &request, timeout).await;
            (idx, outcome)
        }
    }))
    .buffer_unordered(options.max_workers);

    Ok(Box::pin(s))
}
