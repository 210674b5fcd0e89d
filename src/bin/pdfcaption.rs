//! CLI binary for pdfcaption.
//!
//! A thin shim over the library crate. With no arguments it processes the
//! fixed lecture PDF with the local `bakllava` model; every flag only
//! overrides one of those defaults.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfcaption::config::{
    DEFAULT_INPUT, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST, DEFAULT_OUTPUT_DIR, DEFAULT_PROVIDER,
};
use pdfcaption::{
    process_to_files, CaptionFailurePolicy, ProcessConfig, ProcessProgressCallback,
    ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over pages, one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    captions_on_page: AtomicUsize,
    errors_on_page: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Extracting");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            captions_on_page: AtomicUsize::new(0),
            errors_on_page: AtomicUsize::new(0),
        })
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Captioning");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracted {total_pages} pages"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize, image_count: usize) {
        self.captions_on_page.store(0, Ordering::SeqCst);
        self.errors_on_page.store(0, Ordering::SeqCst);
        self.bar
            .set_message(format!("page {page_num} ({image_count} images)"));
    }

    fn on_image_captioned(&self, _page_num: usize, _image_index: usize, _caption_len: usize) {
        self.captions_on_page.fetch_add(1, Ordering::SeqCst);
    }

    fn on_caption_error(&self, page_num: usize, image_index: usize, error: &str) {
        self.errors_on_page.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3} image {}  {}",
            red("✗"),
            page_num,
            image_index + 1,
            red(&msg)
        ));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_chars: usize) {
        let captions = self.captions_on_page.load(Ordering::SeqCst);
        let errors = self.errors_on_page.load(Ordering::SeqCst);
        let mark = if errors == 0 { green("✓") } else { cyan("⚠") };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            mark,
            page_num,
            total_pages,
            dim(&format!("{text_chars:>6} chars")),
            dim(&format!("{captions} captions")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total_pages: usize, _total_images: usize) {
        self.bar.finish_and_clear();
    }
}

/// Extract PDF text, caption its images with a local vision model, and write a report.
#[derive(Parser, Debug)]
#[command(
    name = "pdfcaption",
    version,
    about = "Extract PDF text, caption embedded images with a local vision model, and write a text + JSON report",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// PDF to process.
    #[arg(long, short, env = "PDFCAPTION_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Directory for the .txt and .json reports.
    #[arg(long, short, env = "PDFCAPTION_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Vision model identifier.
    #[arg(long, short, env = "PDFCAPTION_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// edgequake-llm provider serving the model.
    #[arg(long, env = "PDFCAPTION_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_HOST)]
    ollama_host: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDFCAPTION_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max generated tokens per caption.
    #[arg(long, env = "PDFCAPTION_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// What to do when a caption request fails.
    #[arg(long, env = "PDFCAPTION_ON_CAPTION_ERROR", value_enum, default_value = "abort")]
    on_caption_error: FailureArg,

    /// Path to a text file replacing the default caption prompt.
    #[arg(long, env = "PDFCAPTION_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFCAPTION_PASSWORD")]
    password: Option<String>,

    /// libpdfium file or directory; defaults to ./ then the system library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Skip the Ollama model-list check.
    #[arg(long, env = "PDFCAPTION_NO_PREFLIGHT")]
    no_preflight: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFCAPTION_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFCAPTION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFCAPTION_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FailureArg {
    Abort,
    Degrade,
}

impl From<FailureArg> for CaptionFailurePolicy {
    fn from(v: FailureArg) -> Self {
        match v {
            FailureArg::Abort => CaptionFailurePolicy::Abort,
            FailureArg::Degrade => CaptionFailurePolicy::Degrade,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings them back.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !cli.quiet {
        eprintln!("{} {}", cyan("◆"), bold("pdfcaption"));
        eprintln!("   input:  {}", cli.input.display());
        eprintln!("   model:  {} ({})", cli.model, cli.provider);
        eprintln!("   output: {}", cli.output_dir.display());
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ProcessProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    let (report, paths) = process_to_files(&config)
        .await
        .context("Processing failed")?;

    if !cli.quiet {
        let s = &report.stats;
        eprintln!(
            "{}  {} pages  ({} with text, {} with images)",
            if s.failed_captions == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            s.total_pages,
            s.pages_with_text,
            s.pages_with_images,
        );
        eprintln!(
            "   {} characters total{}",
            s.total_chars,
            s.average_chars
                .map(|avg| format!(", {avg:.1} per page"))
                .unwrap_or_default()
        );
        eprintln!(
            "   {} images captioned{}",
            s.total_images - s.failed_captions,
            if s.failed_captions > 0 {
                format!(", {} failed", red(&s.failed_captions.to_string()))
            } else {
                String::new()
            }
        );
        eprintln!("   → {}", bold(&paths.text.display().to_string()));
        eprintln!("   → {}", bold(&paths.json.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `ProcessConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessConfig> {
    let mut builder = ProcessConfig::builder()
        .input(&cli.input)
        .output_dir(&cli.output_dir)
        .model(&cli.model)
        .provider_name(&cli.provider)
        .ollama_host(&cli.ollama_host)
        .temperature(cli.temperature)
        .caption_failure(cli.on_caption_error.into())
        .preflight(!cli.no_preflight);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read caption prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
