//! Progress-callback trait for stage-level generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::QuizConfigBuilder::progress_callback`] to be told when
//! each pipeline stage finishes. The CLI drives a spinner from it; a server
//! could forward the events to a WebSocket.
//!
//! # Example
//!
//! ```rust
//! use pdfquiz::{GenerationProgressCallback, QuizConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl GenerationProgressCallback for PageCounter {
//!     fn on_extracted(&self, pages: usize, _chars: usize) {
//!         self.0.store(pages, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = QuizConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the generation pipeline as it moves through its stages.
///
/// All methods default to no-ops; implement only what you need. Must be
/// `Send + Sync` because requests run on a multi-threaded runtime.
pub trait GenerationProgressCallback: Send + Sync {
    /// Text extraction finished.
    ///
    /// # Arguments
    /// * `pages`: pages that yielded text
    /// * `chars`: total characters extracted, before truncation
    fn on_extracted(&self, pages: usize, chars: usize) {
        let _ = (pages, chars);
    }

    /// The prompt is built and the model is about to be called.
    fn on_generation_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// The model answered with a valid quiz.
    fn on_generation_complete(&self, questions: usize, elapsed_ms: u64) {
        let _ = (questions, elapsed_ms);
    }

    /// The model call or its output failed.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }

    /// The quiz was persisted under `quiz_id`.
    fn on_saved(&self, quiz_id: i64) {
        let _ = quiz_id;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::QuizConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
