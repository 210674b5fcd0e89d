//! Report writer: render a [`Report`] as text and JSON, then write both files.
//!
//! Rendering is pure and deterministic: the same report always produces the
//! same bytes, so re-running on the same input with a deterministic model
//! yields identical files.

use crate::error::PdfCaptionError;
use crate::output::{ImageCaption, PageStats, Report, ReportPaths, ReportStats};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render the human-readable report.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let rule = rule();

    // `write!` into a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "PDF caption report");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Input: {}", report.pdf_path.display());
    let _ = writeln!(out, "Model: {}", report.model);
    let _ = writeln!(out, "Pages: {}", report.stats.total_pages);

    for page in &report.pages {
        let stats = page.stats();
        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Page {}", page.page_num);
        let _ = writeln!(
            out,
            "Text length: {} chars | Images: {} | Caption length: {} chars",
            stats.text_chars, stats.image_count, stats.caption_chars
        );
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        if page.has_text() {
            let _ = writeln!(out, "=== Text Content ===");
            let _ = writeln!(out, "{}", page.text);
        }

        if page.has_image() {
            if page.has_text() {
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "=== Image Descriptions ===");
            for caption in &page.captions {
                let _ = writeln!(out, "[Image {}]: {}", caption.index + 1, caption.display_text());
            }
        }

        if !page.has_text() && !page.has_image() {
            let _ = writeln!(out, "(no text extracted)");
        }
    }

    let s = &report.stats;
    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Statistics");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total pages: {}", s.total_pages);
    match s.text_page_ratio {
        Some(ratio) => {
            let _ = writeln!(out, "Pages with text: {} ({:.1}%)", s.pages_with_text, ratio);
        }
        None => {
            let _ = writeln!(out, "Pages with text: {}", s.pages_with_text);
        }
    }
    let _ = writeln!(out, "Pages with images: {}", s.pages_with_images);
    let _ = writeln!(out, "Total images: {}", s.total_images);
    if s.failed_captions > 0 {
        let _ = writeln!(out, "Failed captions: {}", s.failed_captions);
    }
    let _ = writeln!(out, "Total characters: {}", s.total_chars);
    if let Some(avg) = s.average_chars {
        let _ = writeln!(out, "Average characters per page: {:.1}", avg);
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    pdf_path: String,
    model: &'a str,
    total_pages: usize,
    pages: Vec<JsonPage<'a>>,
    stats: &'a ReportStats,
}

#[derive(Serialize)]
struct JsonPage<'a> {
    page_num: usize,
    text: &'a str,
    captions: &'a [ImageCaption],
    stats: PageStats,
}

/// Render the structured report as pretty-printed JSON.
pub fn render_json(report: &Report) -> Result<String, PdfCaptionError> {
    let doc = JsonReport {
        pdf_path: report.pdf_path.display().to_string(),
        model: &report.model,
        total_pages: report.stats.total_pages,
        pages: report
            .pages
            .iter()
            .map(|p| JsonPage {
                page_num: p.page_num,
                text: &p.text,
                captions: &p.captions,
                stats: p.stats(),
            })
            .collect(),
        stats: &report.stats,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Output file paths for a given input and model.
///
/// `media_uploads/26_lecture.pdf` + `bakllava` →
/// `{dir}/26_lecture_extracted_bakllava.txt` and `.json`.
pub fn output_paths(output_dir: &Path, pdf_path: &Path, model: &str) -> ReportPaths {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "report".to_string());
    let base = format!("{}_extracted_{}", stem, file_safe(model));

    ReportPaths {
        text: output_dir.join(format!("{base}.txt")),
        json: output_dir.join(format!("{base}.json")),
    }
}

/// Replace characters that are awkward in file names (`:` in `llava:13b`).
fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write both renderings into `output_dir`, creating it if needed.
///
/// Existing files are overwritten.
pub async fn write_report(report: &Report, output_dir: &Path) -> Result<ReportPaths, PdfCaptionError> {
    let paths = output_paths(output_dir, &report.pdf_path, &report.model);

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PdfCaptionError::OutputWriteFailed {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

    let text = render_text(report);
    let json = render_json(report)?;

    tokio::fs::write(&paths.text, text)
        .await
        .map_err(|e| PdfCaptionError::OutputWriteFailed {
            path: paths.text.clone(),
            source: e,
        })?;
    tokio::fs::write(&paths.json, json)
        .await
        .map_err(|e| PdfCaptionError::OutputWriteFailed {
            path: paths.json.clone(),
            source: e,
        })?;

    info!(
        "Wrote {} and {}",
        paths.text.display(),
        paths.json.display()
    );
    Ok(paths)
}
