//! Pipeline stages for a captioning run.
//!
//! Each submodule implements one step; [`crate::process`] wires them together.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ encode ──▶ caption ──▶ postprocess ──▶ report
//! (path)    (pdfium)    (PNG)     (VLM)       (cleanup)       (.txt/.json)
//! ```
//!
//! 1. [`input`]     — check the path exists and starts with `%PDF`
//! 2. [`extract`]   — per-page text and image objects; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]    — decoded image → PNG blob → base64 request payload
//! 4. [`preflight`] — warn early when the model is not installed
//! 5. [`caption`]   — one vision request per image, sequentially
//! 6. [`postprocess`] — strip fences and whitespace noise from captions
//! 7. [`report`]    — statistics, text + JSON rendering, file output

pub mod caption;
pub mod encode;
pub mod extract;
pub mod input;
pub mod postprocess;
pub mod preflight;
pub mod report;
