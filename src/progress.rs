//! Progress-callback trait for per-file thumbnail events.
//!
//! Inject an [`Arc<dyn ThumbnailProgressCallback>`] via
//! [`crate::config::ThumbnailConfigBuilder::progress_callback`] to receive
//! events as the dispatcher works through the discovered files. The trait is
//! `Send + Sync` because file events fire from many tokio tasks at once.
//!
//! # Example
//!
//! ```rust
//! use pdf_thumbnailer::{ThumbnailConfig, ThumbnailProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ThumbnailProgressCallback for Counter {
//!     fn on_file_complete(&self, _source: &Path, output: &Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("wrote {}", output.display());
//!     }
//! }
//!
//! let config = ThumbnailConfig::builder()
//!     .source_dir("in")
//!     .destination("out")
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it processes each file.
///
/// All methods default to no-ops so implementors only override what they
/// need. `on_file_start`, `on_file_complete` and `on_file_error` may run
/// concurrently from different threads; protect shared state accordingly.
pub trait ThumbnailProgressCallback: Send + Sync {
    /// Called once after scanning, before any file is dispatched.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called when a file's unit of work acquires its worker slot.
    fn on_file_start(&self, source: &Path) {
        let _ = source;
    }

    /// Called when a thumbnail has been written.
    fn on_file_complete(&self, source: &Path, output: &Path) {
        let _ = (source, output);
    }

    /// Called when a file fails at any step.
    fn on_file_error(&self, source: &Path, error: &str) {
        let _ = (source, error);
    }

    /// Called once after every dispatched file has settled.
    fn on_run_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ThumbnailProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ThumbnailConfig`].
pub type ProgressCallback = Arc<dyn ThumbnailProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ThumbnailProgressCallback for Tracking {
        fn on_file_start(&self, _source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _source: &Path, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _source: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_file_start(Path::new("a.pdf"));
        cb.on_file_complete(Path::new("a.pdf"), Path::new("a.png"));
        cb.on_file_error(Path::new("b.pdf"), "corrupt");
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events_through_arc_dyn() {
        let tracker = Arc::new(Tracking::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_file_start(Path::new("a.pdf"));
        cb.on_file_complete(Path::new("a.pdf"), Path::new("a.png"));
        cb.on_file_start(Path::new("b.pdf"));
        cb.on_file_error(Path::new("b.pdf"), "no page at index 0");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}
