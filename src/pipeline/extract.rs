//! PDF extraction: per-page text and embedded images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is synchronous and
//! keeps thread-local state. [`extract_document`] therefore runs the whole
//! extraction inside one `tokio::task::spawn_blocking` task: the document is
//! opened once, walked page by page, and closed when the task returns.
//!
//! ## Image objects
//!
//! Image objects are collected in the page's object order, descending into
//! form XObjects so grouped figures are found too. An object pdfium cannot
//! decode is skipped with a warning; the rest of the page is unaffected.
//!
//! A page whose text layer cannot be read is kept with empty text.

use crate::error::PdfCaptionError;
use crate::output::{ImageBlob, PageRecord};
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Nesting limit for form XObjects inside form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Bind to a pdfium library.
///
/// Search order: the explicit `lib_path` (a library file or the directory
/// holding it), the current directory, then the system library path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, PdfCaptionError> {
    if let Some(path) = lib_path {
        let candidate = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(path)
        } else {
            path.to_path_buf()
        };
        let bindings = Pdfium::bind_to_library(&candidate).map_err(|e| {
            PdfCaptionError::PdfiumBindingFailed(format!("{}: {:?}", candidate.display(), e))
        })?;
        debug!("Bound pdfium from {}", candidate.display());
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| PdfCaptionError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, mapping pdfium load failures to input errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfCaptionError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PdfCaptionError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                PdfCaptionError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            PdfCaptionError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Plain text of one page, trimmed.
pub fn page_text(page: &PdfPage) -> Result<String, PdfiumError> {
    Ok(page.text()?.all().trim().to_string())
}

/// Text of a page, or empty text when pdfium could not read it.
fn text_or_empty<E: std::fmt::Debug>(page_num: usize, text: Result<String, E>) -> String {
    text.unwrap_or_else(|e| {
        warn!("Page {}: text layer unreadable, keeping empty text ({:?})", page_num, e);
        String::new()
    })
}

/// Depth-first walk in document order: each node, then its children.
///
/// Children are only expanded up to `MAX_FORM_DEPTH` levels below the roots.
fn walk_depth_first<N, F>(nodes: Vec<N>, depth: usize, children: &F, out: &mut Vec<N>)
where
    F: Fn(&N) -> Vec<N>,
{
    for node in nodes {
        let nested = if depth < MAX_FORM_DEPTH {
            children(&node)
        } else {
            Vec::new()
        };
        out.push(node);
        walk_depth_first(nested, depth + 1, children, out);
    }
}

/// The objects drawn by a form XObject; empty for every other object type.
fn form_children<'a>(object: &PdfPageObject<'a>) -> Vec<PdfPageObject<'a>> {
    match object {
        PdfPageObject::XObjectForm(form) => (0..form.len())
            .filter_map(|i| form.get(i).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Every decodable image object of one page, PNG-encoded, in object order.
pub fn page_images(page: &PdfPage, page_num: usize) -> Vec<ImageBlob> {
    let mut objects = Vec::new();
    walk_depth_first(page.objects().iter().collect(), 0, &form_children, &mut objects);

    let mut images = Vec::new();
    for (object_idx, object) in objects.iter().enumerate() {
        let PdfPageObject::Image(image_object) = object else {
            continue;
        };

        let decoded = match image_object.get_raw_image() {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    "Page {}: skipping image object {} (decode failed: {:?})",
                    page_num, object_idx, e
                );
                continue;
            }
        };

        match encode::encode_blob(images.len(), &decoded) {
            Ok(blob) => images.push(blob),
            Err(e) => warn!(
                "Page {}: skipping image object {} (PNG encode failed: {})",
                page_num, object_idx, e
            ),
        }
    }

    images
}

/// Extract text and images of every page, in page order.
///
/// Only document-level failures are fatal: pdfium cannot be bound, or the
/// file cannot be opened. Page-level problems are logged and skipped.
pub async fn extract_document(
    pdf_path: &Path,
    password: Option<&str>,
    pdfium_lib_path: Option<&Path>,
) -> Result<Vec<PageRecord>, PdfCaptionError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);
    let lib_path: Option<PathBuf> = pdfium_lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        extract_document_blocking(&path, password.as_deref(), lib_path.as_deref())
    })
    .await
    .map_err(|e| PdfCaptionError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_document`].
fn extract_document_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    pdfium_lib_path: Option<&Path>,
) -> Result<Vec<PageRecord>, PdfCaptionError> {
    let pdfium = bind_pdfium(pdfium_lib_path)?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut records = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let text = text_or_empty(page_num, page_text(&page));
        let images = page_images(&page, page_num);
        debug!(
            "Page {}: {} chars, {} images",
            page_num,
            text.chars().count(),
            images.len()
        );
        records.push(PageRecord::new(page_num, text, images));
    }

    Ok(records)
}
