use std::sync::Arc;

use async_trait::async_trait;

use super::gemini::GeminiProvider;
use super::provider::{EmbeddingProvider, GenerationProvider};
use super::types::EmbedMode;
use crate::core::config::RagSettings;
use crate::core::errors::ApiError;

/// Front for the two external capabilities the retrieval engine consumes.
///
/// Embedding failures are absorbed here: callers get `None` and decide how to
/// degrade. Generation errors are passed through untouched.
#[derive(Clone)]
pub struct LlmService {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    max_input_chars: usize,
}

impl LlmService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            embedder,
            generator,
            max_input_chars,
        }
    }

    /// Gemini when an API key is configured, otherwise a provider that fails
    /// every call so keyword search and status still work.
    pub fn from_settings(settings: &RagSettings) -> Result<Self, ApiError> {
        let max_input_chars = settings.embedding.max_input_chars;
        match settings.gemini_api_key() {
            Some(key) => {
                let gemini = Arc::new(GeminiProvider::from_settings(settings, key.to_string())?);
                Ok(Self::new(gemini.clone(), gemini, max_input_chars))
            }
            None => {
                tracing::warn!("No Gemini API key configured; semantic search and answers are disabled");
                let unconfigured = Arc::new(UnconfiguredProvider);
                Ok(Self::new(unconfigured.clone(), unconfigured, max_input_chars))
            }
        }
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub async fn embed(&self, text: &str, mode: EmbedMode) -> Option<Vec<f32>> {
        let input = truncate_chars(text, self.max_input_chars);
        match self.embedder.embed(input, mode).await {
            Ok(vector) if !vector.is_empty() => Some(vector),
            Ok(_) => {
                tracing::warn!("Embedding provider {} returned an empty vector", self.embedder.name());
                None
            }
            Err(err) => {
                tracing::warn!("Embedding error: {}", err);
                None
            }
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        self.generator.generate(prompt).await
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

struct UnconfiguredProvider;

#[async_trait]
impl EmbeddingProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>, ApiError> {
        Err(ApiError::ServiceUnavailable(
            "GOOGLE_API_KEY is not configured".to_string(),
        ))
    }
}

#[async_trait]
impl GenerationProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
        Err(ApiError::ServiceUnavailable(
            "GOOGLE_API_KEY is not configured".to_string(),
        ))
    }
}
