//! Progress-callback trait for per-page run events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::config::ProcessConfigBuilder::progress_callback`] to observe the
//! caption stage as it walks the document. Extraction is a single blocking
//! step, so events start once every page has been read.
//!
//! # Example
//!
//! ```rust
//! use pdfcaption::{ProcessConfig, ProcessProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     captions: AtomicUsize,
//! }
//!
//! impl ProcessProgressCallback for CountingCallback {
//!     fn on_image_captioned(&self, page_num: usize, image_index: usize, caption_len: usize) {
//!         self.captions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num} image {image_index}: {caption_len} chars");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { captions: AtomicUsize::new(0) });
//! let config = ProcessConfig::builder()
//!     .progress_callback(cb as Arc<dyn ProcessProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Page numbers are 1-based; image indices are 0-based.
pub trait ProcessProgressCallback: Send + Sync {
    /// Called once after extraction, before the first page is captioned.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before the first caption request of a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize, image_count: usize) {
        let _ = (page_num, total_pages, image_count);
    }

    /// Called after an image was captioned successfully.
    fn on_image_captioned(&self, page_num: usize, image_index: usize, caption_len: usize) {
        let _ = (page_num, image_index, caption_len);
    }

    /// Called when a caption request fails, before the failure policy applies.
    fn on_caption_error(&self, page_num: usize, image_index: usize, error: &str) {
        let _ = (page_num, image_index, error);
    }

    /// Called once every image of the page has been handled.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_chars: usize) {
        let _ = (page_num, total_pages, text_chars);
    }

    /// Called once after the last page, before the reports are written.
    fn on_run_complete(&self, total_pages: usize, total_images: usize) {
        let _ = (total_pages, total_images);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessConfig`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;
