//! Configuration for a captioning run.
//!
//! Every knob lives in [`ProcessConfig`], built via [`ProcessConfigBuilder`].
//! The defaults reproduce the fixed behaviour of the tool: process
//! `media_uploads/26_lecture.pdf` with the local `bakllava` model and write
//! the reports under `test_pdf_processing/output`.

use crate::error::PdfCaptionError;
use crate::pipeline::caption::Captioner;
use crate::progress::ProgressCallback;
use crate::prompts::IMAGE_DESCRIPTION_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default input document, relative to the working directory.
pub const DEFAULT_INPUT: &str = "media_uploads/26_lecture.pdf";
/// Default directory for the two report files.
pub const DEFAULT_OUTPUT_DIR: &str = "test_pdf_processing/output";
/// Default vision model served by Ollama.
pub const DEFAULT_MODEL: &str = "bakllava";
/// Default edgequake-llm provider name.
pub const DEFAULT_PROVIDER: &str = "ollama";
/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Configuration for one run.
///
/// # Example
/// ```rust
/// use pdfcaption::{CaptionFailurePolicy, ProcessConfig};
///
/// let config = ProcessConfig::builder()
///     .input("slides.pdf")
///     .output_dir("out")
///     .model("llava:13b")
///     .caption_failure(CaptionFailurePolicy::Degrade)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llava:13b");
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// PDF to process. Default: [`DEFAULT_INPUT`].
    pub input: PathBuf,

    /// Directory receiving the `.txt` and `.json` reports. Created if missing.
    pub output_dir: PathBuf,

    /// Vision model identifier. Default: `bakllava`.
    pub model: String,

    /// edgequake-llm provider used by the default captioner. Default: `ollama`.
    pub provider_name: String,

    /// Base URL of the Ollama server, for captioning and the model preflight.
    pub ollama_host: String,

    /// Pre-constructed captioner. Takes precedence over `provider_name`.
    pub captioner: Option<Arc<dyn Captioner>>,

    /// Instruction sent with every image.
    pub prompt: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low values keep descriptions literal, which is what a report wants.
    pub temperature: f32,

    /// Optional cap on generated tokens per caption. Default: provider default.
    pub max_tokens: Option<usize>,

    /// What to do when a caption request fails. Default: abort.
    pub caption_failure: CaptionFailurePolicy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to libpdfium. Falls back to `./` then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Check the Ollama model list before captioning. Default: true.
    pub preflight: bool,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            model: DEFAULT_MODEL.to_string(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            captioner: None,
            prompt: IMAGE_DESCRIPTION_PROMPT.to_string(),
            temperature: 0.1,
            max_tokens: None,
            caption_failure: CaptionFailurePolicy::default(),
            password: None,
            pdfium_lib_path: None,
            preflight: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("input", &self.input)
            .field("output_dir", &self.output_dir)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("ollama_host", &self.ollama_host)
            .field("captioner", &self.captioner.as_ref().map(|_| "<dyn Captioner>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("caption_failure", &self.caption_failure)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("preflight", &self.preflight)
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl fmt::Debug for ProcessConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ProcessConfigBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input = path.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn ollama_host(mut self, host: impl Into<String>) -> Self {
        self.config.ollama_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn captioner(mut self, captioner: Arc<dyn Captioner>) -> Self {
        self.config.captioner = Some(captioner);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn caption_failure(mut self, policy: CaptionFailurePolicy) -> Self {
        self.config.caption_failure = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn preflight(mut self, v: bool) -> Self {
        self.config.preflight = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, PdfCaptionError> {
        let c = &self.config;
        if c.input.as_os_str().is_empty() {
            return Err(PdfCaptionError::InvalidConfig("input path is empty".into()));
        }
        if c.model.trim().is_empty() {
            return Err(PdfCaptionError::InvalidConfig("model name is empty".into()));
        }
        if c.prompt.trim().is_empty() {
            return Err(PdfCaptionError::InvalidConfig("caption prompt is empty".into()));
        }
        if !(c.ollama_host.starts_with("http://") || c.ollama_host.starts_with("https://")) {
            return Err(PdfCaptionError::InvalidConfig(format!(
                "Ollama host must be an http(s) URL, got '{}'",
                c.ollama_host
            )));
        }
        if c.max_tokens == Some(0) {
            return Err(PdfCaptionError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the caption stage does when a model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptionFailurePolicy {
    /// Stop the run at the first failed caption; no report is written. (default)
    #[default]
    Abort,
    /// Record the failure on that image's caption slot and keep going.
    Degrade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_run() {
        let c = ProcessConfig::default();
        assert_eq!(c.input, PathBuf::from("media_uploads/26_lecture.pdf"));
        assert_eq!(c.output_dir, PathBuf::from("test_pdf_processing/output"));
        assert_eq!(c.model, "bakllava");
        assert_eq!(c.provider_name, "ollama");
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.caption_failure, CaptionFailurePolicy::Abort);
        assert!(c.preflight);
    }

    #[test]
    fn builder_trims_host_slash() {
        let c = ProcessConfig::builder()
            .ollama_host("http://gpu-box:11434/")
            .build()
            .unwrap();
        assert_eq!(c.ollama_host, "http://gpu-box:11434");
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ProcessConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, PdfCaptionError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_host() {
        let err = ProcessConfig::builder()
            .ollama_host("localhost:11434")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ProcessConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_redacts_password() {
        let c = ProcessConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
