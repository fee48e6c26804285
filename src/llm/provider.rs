use async_trait::async_trait;

use super::types::EmbedMode;
use crate::core::errors::ApiError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// embed one text; an empty vector counts as failure for callers
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>, ApiError>;
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// single-turn completion, returned as plain text
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}
