//! Error types for the pdfcaption library.
//!
//! [`PdfCaptionError`] covers every failure that stops a run. Problems that
//! only affect one embedded image (an object pdfium cannot decode, or a
//! caption that failed under [`crate::config::CaptionFailurePolicy::Degrade`])
//! are not errors at this level: they are logged, or stored on the
//! [`crate::output::ImageCaption`] they belong to.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfcaption library.
#[derive(Debug, Error)]
pub enum PdfCaptionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Caption errors ────────────────────────────────────────────────────
    /// The configured provider could not be built (unknown name, missing key).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model server failed to caption an image.
    #[error("Captioning image {image} on page {page} failed: {detail}\nIs the model server running? Re-run with --on-caption-error degrade to keep going.")]
    CaptionFailed {
        page: usize,
        image: usize,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write one of the report files.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structured report could not be encoded as JSON.
    #[error("Failed to serialise report: {0}")]
    Serialize(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib), place the\n\
library in the working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
