//! Integration tests for the caption + report stages.
//!
//! These run without pdfium or a model server: pages are built by hand and
//! captioned by a stub [`Captioner`], then written to a temp directory.

use async_trait::async_trait;
use pdfcaption::pipeline::report::{render_text, write_report};
use pdfcaption::{
    build_report, CaptionError, CaptionFailurePolicy, Captioner, ImageBlob, PageRecord,
    PdfCaptionError, ProcessConfig, ProcessProgressCallback,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Describes each image by its page-local index and size; deterministic.
struct EchoCaptioner {
    calls: AtomicUsize,
}

impl EchoCaptioner {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Captioner for EchoCaptioner {
    async fn caption(&self, image: &ImageBlob, _prompt: &str) -> Result<String, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "A {}x{} figure (#{}).\n",
            image.width,
            image.height,
            image.index + 1
        ))
    }
}

/// Fails every request, like an Ollama server that is not running.
struct DownCaptioner;

#[async_trait]
impl Captioner for DownCaptioner {
    async fn caption(&self, _image: &ImageBlob, _prompt: &str) -> Result<String, CaptionError> {
        Err("error sending request for url (http://localhost:11434/api/chat)".into())
    }
}

fn blob(index: usize) -> ImageBlob {
    ImageBlob {
        index,
        data: vec![0x89, b'P', b'N', b'G'],
        mime_type: "image/png".into(),
        width: 640,
        height: 480,
    }
}

/// The 3-page example: 500/300/0 chars with 1/0/2 images.
fn three_pages() -> Vec<PageRecord> {
    vec![
        PageRecord::new(1, "x".repeat(500), vec![blob(0)]),
        PageRecord::new(2, "y".repeat(300), vec![]),
        PageRecord::new(3, "", vec![blob(0), blob(1)]),
    ]
}

fn config() -> ProcessConfig {
    ProcessConfig::builder().preflight(false).build().unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_page_example_statistics() {
    let captioner = EchoCaptioner::new();
    let report = build_report(&captioner, "lecture.pdf", three_pages(), &config())
        .await
        .unwrap();

    assert_eq!(report.stats.total_pages, 3);
    assert_eq!(report.stats.total_chars, 800);
    let avg = report.stats.average_chars.unwrap();
    assert!((avg - 800.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.image_flags(), vec![true, false, true]);
    assert_eq!(captioner.calls.load(Ordering::SeqCst), 3);

    let text = render_text(&report);
    assert!(text.contains("Average characters per page: 266.7"));
}

#[tokio::test]
async fn every_page_gets_aligned_captions() {
    let report = build_report(&EchoCaptioner::new(), "lecture.pdf", three_pages(), &config())
        .await
        .unwrap();

    for page in &report.pages {
        assert_eq!(page.captions.len(), page.images.len(), "page {}", page.page_num);
        for (caption, image) in page.captions.iter().zip(&page.images) {
            assert_eq!(caption.index, image.index);
        }
    }
    assert!(report.pages[1].captions.is_empty());
    assert_eq!(report.pages[2].captions[1].text, "A 640x480 figure (#2).");
}

#[tokio::test]
async fn pages_are_reported_in_page_order() {
    let mut pages = three_pages();
    pages.reverse();
    let report = build_report(&EchoCaptioner::new(), "lecture.pdf", pages, &config())
        .await
        .unwrap();

    let order: Vec<usize> = report.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(order, vec![1, 2, 3]);
}

#[tokio::test]
async fn rerun_writes_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config();

    let first = build_report(&EchoCaptioner::new(), "26_lecture.pdf", three_pages(), &cfg)
        .await
        .unwrap();
    let paths = write_report(&first, dir.path()).await.unwrap();
    let text_1 = std::fs::read(&paths.text).unwrap();
    let json_1 = std::fs::read(&paths.json).unwrap();

    let second = build_report(&EchoCaptioner::new(), "26_lecture.pdf", three_pages(), &cfg)
        .await
        .unwrap();
    let paths = write_report(&second, dir.path()).await.unwrap();

    assert_eq!(text_1, std::fs::read(&paths.text).unwrap());
    assert_eq!(json_1, std::fs::read(&paths.json).unwrap());
    assert_eq!(
        paths.text.file_name().unwrap(),
        "26_lecture_extracted_bakllava.txt"
    );
}

#[tokio::test]
async fn unreachable_model_aborts_by_default() {
    let err = build_report(&DownCaptioner, "lecture.pdf", three_pages(), &config())
        .await
        .unwrap_err();

    match err {
        PdfCaptionError::CaptionFailed { page, image, .. } => assert_eq!((page, image), (1, 1)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_model_degrades_when_configured() {
    let cfg = ProcessConfig::builder()
        .preflight(false)
        .caption_failure(CaptionFailurePolicy::Degrade)
        .build()
        .unwrap();

    let report = build_report(&DownCaptioner, "lecture.pdf", three_pages(), &cfg)
        .await
        .unwrap();

    assert_eq!(report.stats.failed_captions, 3);
    assert!(report.pages[0].captions[0].error.is_some());
    assert_eq!(report.stats.total_chars, 800);

    let text = render_text(&report);
    assert!(text.contains("[Image 1]: Caption unavailable (error sending request"));
    assert!(text.contains("Failed captions: 3"));
}

#[tokio::test]
async fn empty_document_has_no_sections_and_no_average() {
    let dir = tempfile::tempdir().unwrap();
    let report = build_report(&EchoCaptioner::new(), "blank.pdf", vec![], &config())
        .await
        .unwrap();
    let paths = write_report(&report, dir.path()).await.unwrap();

    let text = std::fs::read_to_string(&paths.text).unwrap();
    assert!(!text.contains("\nPage "));
    assert!(!text.contains("Average characters"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    assert_eq!(json["total_pages"], 0);
    assert!(json["stats"]["average_chars"].is_null());
}

#[derive(Default)]
struct CountingCallback {
    run_start: AtomicUsize,
    pages: AtomicUsize,
    captions: AtomicUsize,
    run_complete_images: AtomicUsize,
}

impl ProcessProgressCallback for CountingCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.run_start.store(total_pages, Ordering::SeqCst);
    }

    fn on_image_captioned(&self, _page_num: usize, _image_index: usize, _caption_len: usize) {
        self.captions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _text_chars: usize) {
        self.pages.fetch_add(1, Ordering::SeqCst);
    }

    fn on_run_complete(&self, _total_pages: usize, total_images: usize) {
        self.run_complete_images.store(total_images, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_page_and_caption() {
    let cb = Arc::new(CountingCallback::default());
    let cfg = ProcessConfig::builder()
        .preflight(false)
        .progress_callback(Arc::clone(&cb) as Arc<dyn ProcessProgressCallback>)
        .build()
        .unwrap();

    build_report(&EchoCaptioner::new(), "lecture.pdf", three_pages(), &cfg)
        .await
        .unwrap();

    assert_eq!(cb.run_start.load(Ordering::SeqCst), 3);
    assert_eq!(cb.pages.load(Ordering::SeqCst), 3);
    assert_eq!(cb.captions.load(Ordering::SeqCst), 3);
    assert_eq!(cb.run_complete_images.load(Ordering::SeqCst), 3);
}
