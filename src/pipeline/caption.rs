//! Caption stage: send each extracted image to a vision model.
//!
//! The backend sits behind the [`Captioner`] trait. The default
//! implementation, [`LlmCaptioner`], drives an `edgequake-llm` provider
//! (Ollama unless configured otherwise); callers and tests can inject their
//! own through [`crate::config::ProcessConfigBuilder::captioner`].
//!
//! Images are captioned strictly one at a time, in page order then image
//! order. There is no retry: a failed request is handled by
//! [`CaptionFailurePolicy`] and nothing else.

use crate::config::{CaptionFailurePolicy, ProcessConfig};
use crate::error::PdfCaptionError;
use crate::output::{ImageBlob, ImageCaption, PageRecord};
use crate::pipeline::{encode, postprocess};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OllamaProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Error type returned by caption backends.
pub type CaptionError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can describe an image.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Return the raw model description of `image` for `prompt`.
    async fn caption(&self, image: &ImageBlob, prompt: &str) -> Result<String, CaptionError>;
}

/// [`Captioner`] backed by an `edgequake-llm` chat provider.
///
/// Each request is a single user message carrying the prompt and one
/// base64 PNG, which is what Ollama's multimodal models expect.
pub struct LlmCaptioner {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmCaptioner {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: Option<usize>) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens,
                ..Default::default()
            },
        }
    }

    /// Build the provider named in the config for the configured model.
    pub fn from_config(config: &ProcessConfig) -> Result<Self, PdfCaptionError> {
        let provider = build_provider(config)?;
        Ok(Self::new(provider, config.temperature, config.max_tokens))
    }
}

/// Create the chat provider for `config.provider_name`.
///
/// Ollama is pointed at `config.ollama_host`, the same server the preflight
/// checks. Other providers come from `ProviderFactory` and read their
/// endpoints and keys from the environment.
pub fn build_provider(config: &ProcessConfig) -> Result<Arc<dyn LLMProvider>, PdfCaptionError> {
    if config.provider_name == "ollama" {
        let provider = ollama_provider(&config.ollama_host, &config.model)?;
        return Ok(Arc::new(provider));
    }
    ProviderFactory::create_llm_provider(&config.provider_name, &config.model).map_err(|e| {
        PdfCaptionError::ProviderNotConfigured {
            provider: config.provider_name.clone(),
            hint: format!("{e}"),
        }
    })
}

fn ollama_provider(host: &str, model: &str) -> Result<OllamaProvider, PdfCaptionError> {
    OllamaProvider::builder()
        .host(host)
        .model(model)
        .build()
        .map_err(|e| PdfCaptionError::ProviderNotConfigured {
            provider: "ollama".into(),
            hint: format!("{e}"),
        })
}

#[async_trait]
impl Captioner for LlmCaptioner {
    async fn caption(&self, image: &ImageBlob, prompt: &str) -> Result<String, CaptionError> {
        let messages = vec![ChatMessage::user_with_images(
            prompt,
            vec![encode::to_image_data(image)],
        )];
        let response = self.provider.chat(&messages, Some(&self.options)).await?;
        debug!(
            "Caption: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Use the injected captioner, or build the default one from the config.
pub fn resolve_captioner(config: &ProcessConfig) -> Result<Arc<dyn Captioner>, PdfCaptionError> {
    if let Some(ref captioner) = config.captioner {
        return Ok(Arc::clone(captioner));
    }
    let captioner = LlmCaptioner::from_config(config)?;
    info!(
        "Captioning with provider '{}', model '{}'",
        config.provider_name, config.model
    );
    Ok(Arc::new(captioner))
}

/// Caption every image of every page, in order.
///
/// On return each page's `captions` has exactly one entry per image.
/// Under [`CaptionFailurePolicy::Abort`] the first failure is returned as
/// [`PdfCaptionError::CaptionFailed`] and the remaining images are not sent.
pub async fn caption_pages(
    captioner: &dyn Captioner,
    mut pages: Vec<PageRecord>,
    config: &ProcessConfig,
) -> Result<Vec<PageRecord>, PdfCaptionError> {
    let total_pages = pages.len();

    for page in pages.iter_mut() {
        let page_num = page.page_num;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages, page.images.len());
        }

        let mut captions = Vec::with_capacity(page.images.len());
        for image in &page.images {
            let start = Instant::now();
            match captioner.caption(image, &config.prompt).await {
                Ok(raw) => {
                    let text = postprocess::clean_caption(&raw);
                    debug!(
                        "Page {} image {}: {} chars in {:?}",
                        page_num,
                        image.index + 1,
                        text.chars().count(),
                        start.elapsed()
                    );
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_image_captioned(page_num, image.index, text.chars().count());
                    }
                    captions.push(ImageCaption::ok(image.index, text));
                }
                Err(e) => {
                    let detail = e.to_string();
                    warn!(
                        "Page {} image {}: caption failed — {}",
                        page_num,
                        image.index + 1,
                        detail
                    );
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_caption_error(page_num, image.index, &detail);
                    }
                    match config.caption_failure {
                        CaptionFailurePolicy::Abort => {
                            return Err(PdfCaptionError::CaptionFailed {
                                page: page_num,
                                image: image.index + 1,
                                detail,
                            });
                        }
                        CaptionFailurePolicy::Degrade => {
                            captions.push(ImageCaption::failed(image.index, detail));
                        }
                    }
                }
            }
        }
        page.captions = captions;

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total_pages, page.text_chars());
        }
    }

    Ok(pages)
}
