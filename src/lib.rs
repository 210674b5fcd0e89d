//! # pdfcaption
//!
//! Extract the text and embedded images of a PDF, caption every image with a
//! locally served vision model, and write a combined report as text and JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate path + %PDF magic
//!  ├─ 2. Extract   per-page text and image objects via pdfium (spawn_blocking)
//!  ├─ 3. Encode    image objects → PNG → base64
//!  ├─ 4. Caption   one request per image to Ollama (bakllava by default)
//!  ├─ 5. Polish    caption cleanup (fences, whitespace, invisible chars)
//!  └─ 6. Report    per-page + aggregate stats, .txt and .json files
//! ```
//!
//! Everything runs sequentially; each caption request completes before the
//! next one is sent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfcaption::{process_to_files, ProcessConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Defaults: media_uploads/26_lecture.pdf, bakllava on localhost:11434
//!     let config = ProcessConfig::default();
//!     let (report, paths) = process_to_files(&config).await?;
//!     eprintln!(
//!         "{} pages, {} chars → {}",
//!         report.stats.total_pages,
//!         report.stats.total_chars,
//!         paths.text.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfcaption` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CaptionFailurePolicy, ProcessConfig, ProcessConfigBuilder};
pub use error::PdfCaptionError;
pub use output::{ImageBlob, ImageCaption, PageRecord, PageStats, Report, ReportPaths, ReportStats};
pub use pipeline::caption::{CaptionError, Captioner, LlmCaptioner};
pub use process::{build_report, process, process_sync, process_to_files};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
