//! Run output types: page records, captions, and report statistics.
//!
//! A [`PageRecord`] is built once per page by the extraction stage, gets its
//! captions filled in by the caption stage, and is never mutated after the
//! [`Report`] is assembled. Statistics are derived from the records on demand
//! so they can never drift from the data they summarise.

use serde::Serialize;
use std::path::PathBuf;

/// One raster image embedded in a PDF page, normalised to PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    /// 0-based position of the image among the page's image objects that decoded.
    pub index: usize,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// MIME type of `data` (always `image/png` for extracted images).
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// The caption produced for one [`ImageBlob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageCaption {
    /// Same index as the image it describes.
    pub index: usize,
    /// Cleaned model output. Empty when captioning failed.
    pub text: String,
    /// Failure detail, only present under the degrade policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageCaption {
    pub fn ok(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            text: String::new(),
            error: Some(error.into()),
        }
    }

    /// Text shown in the human-readable report for this slot.
    pub fn display_text(&self) -> String {
        match &self.error {
            Some(e) => format!("Caption unavailable ({e})"),
            None if self.text.is_empty() => "(empty description)".to_string(),
            None => self.text.clone(),
        }
    }
}

/// Everything extracted for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// 1-based page number.
    pub page_num: usize,
    /// Trimmed plain text of the page.
    pub text: String,
    pub images: Vec<ImageBlob>,
    /// Aligned by position with `images` once captioning has run.
    pub captions: Vec<ImageCaption>,
}

impl PageRecord {
    pub fn new(page_num: usize, text: impl Into<String>, images: Vec<ImageBlob>) -> Self {
        Self {
            page_num,
            text: text.into(),
            images,
            captions: Vec::new(),
        }
    }

    pub fn text_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn has_image(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn stats(&self) -> PageStats {
        PageStats {
            text_chars: self.text_chars(),
            image_count: self.images.len(),
            caption_chars: self.captions.iter().map(|c| c.text.chars().count()).sum(),
            has_text: self.has_text(),
            has_image: self.has_image(),
        }
    }
}

/// Per-page statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub text_chars: usize,
    pub image_count: usize,
    pub caption_chars: usize,
    pub has_text: bool,
    pub has_image: bool,
}

/// Aggregate statistics across all pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStats {
    pub total_pages: usize,
    /// Sum of per-page text lengths, in characters.
    pub total_chars: usize,
    /// `total_chars / total_pages`; `None` for an empty document.
    pub average_chars: Option<f64>,
    pub pages_with_text: usize,
    pub pages_with_images: usize,
    /// Percentage of pages with non-blank text; `None` for an empty document.
    pub text_page_ratio: Option<f64>,
    pub total_images: usize,
    pub failed_captions: usize,
}

impl ReportStats {
    pub fn from_pages(pages: &[PageRecord]) -> Self {
        let total_pages = pages.len();
        let total_chars: usize = pages.iter().map(PageRecord::text_chars).sum();
        let pages_with_text = pages.iter().filter(|p| p.has_text()).count();

        let (average_chars, text_page_ratio) = if total_pages > 0 {
            (
                Some(total_chars as f64 / total_pages as f64),
                Some(pages_with_text as f64 / total_pages as f64 * 100.0),
            )
        } else {
            (None, None)
        };

        Self {
            total_pages,
            total_chars,
            average_chars,
            pages_with_text,
            pages_with_images: pages.iter().filter(|p| p.has_image()).count(),
            text_page_ratio,
            total_images: pages.iter().map(|p| p.images.len()).sum(),
            failed_captions: pages
                .iter()
                .flat_map(|p| &p.captions)
                .filter(|c| c.error.is_some())
                .count(),
        }
    }
}

/// The complete result of one run.
#[derive(Debug, Clone)]
pub struct Report {
    pub pdf_path: PathBuf,
    pub model: String,
    /// Sorted by `page_num`.
    pub pages: Vec<PageRecord>,
    pub stats: ReportStats,
}

impl Report {
    /// Assemble a report, ordering pages by number and computing statistics.
    pub fn new(pdf_path: impl Into<PathBuf>, model: impl Into<String>, mut pages: Vec<PageRecord>) -> Self {
        pages.sort_by_key(|p| p.page_num);
        let stats = ReportStats::from_pages(&pages);
        Self {
            pdf_path: pdf_path.into(),
            model: model.into(),
            pages,
            stats,
        }
    }

    /// Per-page has-image flags in page order.
    pub fn image_flags(&self) -> Vec<bool> {
        self.pages.iter().map(PageRecord::has_image).collect()
    }
}

/// Paths of the two files written by [`crate::pipeline::report::write_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub text: PathBuf,
    pub json: PathBuf,
}
