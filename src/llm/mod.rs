pub mod gemini;
pub mod provider;
pub mod service;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use gemini::GeminiProvider;
pub use provider::{EmbeddingProvider, GenerationProvider};
pub use service::LlmService;
pub use types::EmbedMode;
