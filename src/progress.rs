//! Progress-callback trait for per-unit conversion events.
//!
//! A *unit* is one image or one PDF page. Before a batch starts the
//! orchestrator counts every unit it expects to produce, then reports
//! `completed / total` after each one finishes, in input order.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`].
//!
//! # Example
//!
//! ```rust
//! use pixpdf::{ConversionConfig, ConversionProgressCallback, ProgressState};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_progress(&self, state: ProgressState) {
//!         eprintln!("{}/{}", state.completed, state.total);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot of batch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub completed: usize,
    pub total: usize,
}

/// Called by the conversion pipeline as it completes each unit.
///
/// Pages run on a blocking worker thread, so implementations must be
/// `Send + Sync`. Calls for one batch are never concurrent with each other.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the pre-scan, before any unit is converted.
    fn on_batch_start(&self, total_units: usize) {
        let _ = total_units;
    }

    /// Called after each image or page is finished.
    fn on_progress(&self, state: ProgressState) {
        let _ = state;
    }

    /// Called when a file is skipped or fails without aborting the batch.
    fn on_warning(&self, message: &str) {
        let _ = message;
    }

    /// Called once when the batch ends, successfully or not. Progress state
    /// should be cleared here.
    fn on_batch_complete(&self, results: usize, warnings: usize) {
        let _ = (results, warnings);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Monotonic progress counter shared by one run.
///
/// `advance` never moves backwards and never passes `total`, even when the
/// pre-scan under-counted (a PDF that failed to parse during pre-scan but
/// converted later).
///
/// `on_batch_complete` fires exactly once: from [`ProgressTracker::finish`],
/// or from `Drop` if the run ended early (an error or a panicked worker).
pub(crate) struct ProgressTracker {
    callback: Option<ProgressCallback>,
    completed: usize,
    total: usize,
    finished: bool,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Option<ProgressCallback>, total: usize) -> Self {
        if let Some(ref cb) = callback {
            cb.on_batch_start(total);
        }
        Self {
            callback,
            completed: 0,
            total,
            finished: false,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.completed += 1;
        if self.completed > self.total {
            self.total = self.completed;
        }
        if let Some(ref cb) = self.callback {
            cb.on_progress(ProgressState {
                completed: self.completed,
                total: self.total,
            });
        }
    }

    pub(crate) fn warn(&self, message: &str) {
        if let Some(ref cb) = self.callback {
            cb.on_warning(message);
        }
    }

    pub(crate) fn finish(mut self, results: usize, warnings: usize) {
        self.finished = true;
        if let Some(ref cb) = self.callback {
            cb.on_batch_complete(results, warnings);
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ProgressState {
        ProgressState {
            completed: self.completed,
            total: self.total,
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(ref cb) = self.callback {
            cb.on_batch_complete(0, 0);
        }
    }
}
