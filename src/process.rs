//! Run entry points: extract → caption → report.
//!
//! [`process`] returns the assembled [`Report`] without touching the output
//! directory; [`process_to_files`] also writes the text and JSON reports.
//! Both abort on the first fatal error, so a failed run never leaves a
//! partially written report behind.

use crate::config::ProcessConfig;
use crate::error::PdfCaptionError;
use crate::output::{PageRecord, Report, ReportPaths};
use crate::pipeline::{caption, extract, input, preflight, report};
use std::time::Instant;
use tracing::{debug, info};

/// Process the configured PDF and return the report.
///
/// # Errors
/// Returns `Err(PdfCaptionError)` for:
/// - a missing, unreadable, encrypted, or corrupt input
/// - a captioning provider that cannot be built
/// - a failed caption under [`crate::CaptionFailurePolicy::Abort`]
pub async fn process(config: &ProcessConfig) -> Result<Report, PdfCaptionError> {
    let start = Instant::now();
    info!("Starting run: {}", config.input.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::validate_input(&config.input)?;

    // ── Step 2: Resolve captioner ────────────────────────────────────────
    let captioner = caption::resolve_captioner(config)?;

    // ── Step 3: Model preflight ──────────────────────────────────────────
    if config.preflight && config.captioner.is_none() && config.provider_name == "ollama" {
        preflight::warn_if_model_missing(&config.ollama_host, &config.model).await;
    }

    // ── Step 4: Extract text + images ────────────────────────────────────
    let extract_start = Instant::now();
    let pages = extract::extract_document(
        &pdf_path,
        config.password.as_deref(),
        config.pdfium_lib_path.as_deref(),
    )
    .await?;
    info!(
        "Extracted {} pages ({} images) in {}ms",
        pages.len(),
        pages.iter().map(|p| p.images.len()).sum::<usize>(),
        extract_start.elapsed().as_millis()
    );

    // ── Step 5: Caption + assemble ───────────────────────────────────────
    let report = build_report(captioner.as_ref(), pdf_path, pages, config).await?;

    info!(
        "Run complete: {} pages, {} images, {}ms total",
        report.stats.total_pages,
        report.stats.total_images,
        start.elapsed().as_millis()
    );
    Ok(report)
}

/// Caption extracted pages and assemble the report.
///
/// This is the part of [`process`] that runs after pdfium is done, exposed
/// so callers holding already-extracted pages can reuse it.
pub async fn build_report(
    captioner: &dyn caption::Captioner,
    pdf_path: impl Into<std::path::PathBuf>,
    pages: Vec<PageRecord>,
    config: &ProcessConfig,
) -> Result<Report, PdfCaptionError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(pages.len());
    }

    let caption_start = Instant::now();
    let pages = caption::caption_pages(captioner, pages, config).await?;
    debug!("Captioning took {}ms", caption_start.elapsed().as_millis());

    let report = Report::new(pdf_path, config.model.clone(), pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(report.stats.total_pages, report.stats.total_images);
    }
    Ok(report)
}

/// Process the configured PDF and write both report files.
pub async fn process_to_files(
    config: &ProcessConfig,
) -> Result<(Report, ReportPaths), PdfCaptionError> {
    let report = process(config).await?;
    let paths = report::write_report(&report, &config.output_dir).await?;
    Ok((report, paths))
}

/// Synchronous wrapper around [`process_to_files`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(config: &ProcessConfig) -> Result<(Report, ReportPaths), PdfCaptionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfCaptionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_to_files(config))
}
