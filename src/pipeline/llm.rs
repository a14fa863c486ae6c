//! Field extraction: prompt a text-generation model and parse its answer.
//!
//! The model sits behind the [`TextGenerator`] trait. The pipeline owns one
//! instance, built once at startup, and lends it to [`extract_fields`] by
//! reference. Production code uses [`LlmGenerator`] (any `edgequake-llm`
//! provider); tests plug in a scripted generator and get the same parsing and
//! degradation behaviour without a network.
//!
//! ## Failure policy
//!
//! Extraction never fails the submission. A provider error or an answer
//! with no `Label: value` lines becomes an empty [`ExtractedFields`], and the
//! letter is rendered with blank values.

use crate::config::{Decoding, LetterKind, PipelineConfig};
use crate::error::{GenerationError, SuratError};
use crate::fields::{parse_fields, ExtractedFields};
use crate::prompts::extraction_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Decoding parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub decoding: Decoding,
    pub max_new_tokens: usize,
}

impl GenerationOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            decoding: config.decoding,
            max_new_tokens: config.max_new_tokens,
        }
    }
}

/// A model that continues a prompt with text.
pub trait TextGenerator: Send + Sync {
    /// Generate a continuation of `prompt` and return it decoded.
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// [`TextGenerator`] backed by an `edgequake-llm` chat provider.
#[derive(Clone)]
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the provider from the config and environment.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, SuratError> {
        resolve_provider(config).map(Self::new)
    }
}

impl TextGenerator for LlmGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let messages = vec![ChatMessage::user(prompt)];
        let completion = build_options(options);

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Map the configured decoding strategy onto provider options.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    let (temperature, top_p) = match options.decoding {
        Decoding::Greedy => (0.0, None),
        Decoding::Sampled { temperature, top_p } => (temperature, Some(top_p)),
    };
    CompletionOptions {
        temperature: Some(temperature),
        top_p,
        max_tokens: Some(options.max_new_tokens),
        ..Default::default()
    }
}

/// Cut `text` to at most `budget` whitespace-separated words.
///
/// Words approximate model tokens; the original spacing of the kept prefix is
/// preserved. Returns the input unchanged when it fits.
pub fn truncate_to_token_budget(text: &str, budget: usize) -> &str {
    let mut words = 0;
    let mut in_word = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == budget {
                return text[..idx].trim_end();
            }
            in_word = true;
            words += 1;
        }
    }
    text
}

/// Extract the fields of `kind` from a document's text.
///
/// Never fails: generation errors and unusable answers yield an empty set.
pub async fn extract_fields<G: TextGenerator>(
    generator: &G,
    text: &str,
    kind: LetterKind,
    config: &PipelineConfig,
) -> ExtractedFields {
    let start = Instant::now();
    let body = truncate_to_token_budget(text, config.max_input_tokens);
    if body.len() < text.len() {
        debug!(
            "Document truncated to {} approximate tokens ({} of {} bytes kept)",
            config.max_input_tokens,
            body.len(),
            text.len()
        );
    }

    let prompt = extraction_prompt(kind, body);
    let options = GenerationOptions::from_config(config);

    let output = match generator.generate(&prompt, &options).await {
        Ok(output) if output.trim().is_empty() => {
            warn!("Field extraction failed: {}", GenerationError::EmptyOutput);
            return ExtractedFields::new();
        }
        Ok(output) => output,
        Err(e) => {
            warn!("Field extraction failed: {}", e);
            return ExtractedFields::new();
        }
    };

    let fields = parse_fields(&output);
    if fields.is_empty() {
        warn!("Model output contained no 'Label: value' lines");
    }
    info!(
        "Extracted {} fields for '{}' in {}ms",
        fields.len(),
        kind,
        start.elapsed().as_millis()
    );
    fields
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`), via
///    [`ProviderFactory::create_llm_provider`], which reads the matching API
///    key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present**: OpenAI with the configured or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, SuratError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SuratError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SuratError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SuratError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
