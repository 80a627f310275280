//! Progress-callback trait for per-source batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchOptionsBuilder::progress`] to receive real-time
//! events as the driver works through a batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, a database record, or a
//! terminal progress bar without the library knowing anything about how the
//! host application communicates. The trait is `Send + Sync` so it works
//! correctly when sources are converted concurrently.

use std::sync::Arc;

/// Called by the batch driver as it works through each source.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// With `max_workers > 1`, `on_source_start`, `on_source_complete`, and
/// `on_source_error` may be called concurrently from different tasks.
/// Implementations must protect shared mutable state with appropriate
/// synchronisation primitives (e.g. `Mutex`, `AtomicUsize`).
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any source is dispatched.
    fn on_batch_start(&self, total_sources: usize) {
        let _ = total_sources;
    }

    /// Called just before a source's conversion is dispatched.
    ///
    /// `n` is the 1-indexed position of the source in the input list.
    fn on_source_start(&self, n: usize, total_sources: usize, source: &str) {
        let _ = (n, total_sources, source);
    }

    /// Called when a source is successfully converted.
    ///
    /// `content_len` is the byte length of the exported content.
    fn on_source_complete(&self, n: usize, total_sources: usize, source: &str, content_len: usize) {
        let _ = (n, total_sources, source, content_len);
    }

    /// Called when a source's conversion fails.
    fn on_source_error(&self, n: usize, total_sources: usize, source: &str, error: &str) {
        let _ = (n, total_sources, source, error);
    }

    /// Called once after every source has been attempted.
    fn on_batch_complete(&self, total_sources: usize, succeeded: usize) {
        let _ = (total_sources, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchOptions`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        final_succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_source_start(&self, _n: usize, _total: usize, _source: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_source_complete(&self, _n: usize, _total: usize, _source: &str, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_source_error(&self, _n: usize, _total: usize, _source: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, succeeded: usize) {
            self.final_succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_source_start(1, 3, "a.pdf");
        cb.on_source_complete(1, 3, "a.pdf", 42);
        cb.on_source_error(2, 3, "b.pdf", "boom");
        cb.on_batch_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            final_succeeded: AtomicUsize::new(0),
        };

        tracker.on_batch_start(2);
        tracker.on_source_start(1, 2, "a.pdf");
        tracker.on_source_complete(1, 2, "a.pdf", 100);
        tracker.on_source_start(2, 2, "b.pdf");
        tracker.on_source_error(2, 2, "b.pdf", "unreachable");
        tracker.on_batch_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_source_complete(1, 10, "x.docx", 512);
    }
}
