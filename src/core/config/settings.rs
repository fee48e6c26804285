//! Typed view over the merged YAML configuration.
//!
//! Every section and field is optional in the files; anything absent falls
//! back to the values in [`super::defaults`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub corpus: CorpusSettings,
    pub cache: CacheSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub gemini: GeminiSettings,
    pub query: QuerySettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Directory holding the batch files.
    pub dir: String,
    /// Batch file extension, without the dot.
    pub extension: String,
    /// Segments shorter than this are never embedded.
    pub min_chunk_chars: usize,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            dir: defaults::CORPUS_DIR.to_string(),
            extension: defaults::CORPUS_EXTENSION.to_string(),
            min_chunk_chars: defaults::MIN_CHUNK_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub path: String,
    /// Save after this many successful embeddings during a build.
    pub checkpoint_interval: usize,
    pub preview_chars: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: defaults::CACHE_PATH.to_string(),
            checkpoint_interval: defaults::CHECKPOINT_INTERVAL,
            preview_chars: defaults::PREVIEW_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub max_input_chars: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: defaults::EMBEDDING_MODEL.to_string(),
            max_input_chars: defaults::MAX_EMBED_INPUT_CHARS,
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: defaults::GENERATION_MODEL.to_string(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::GEMINI_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub default_max_results: usize,
    pub max_results_cap: usize,
    pub max_question_chars: usize,
    pub example_queries: Vec<String>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_max_results: defaults::DEFAULT_MAX_RESULTS,
            max_results_cap: defaults::MAX_RESULTS_CAP,
            max_question_chars: defaults::MAX_QUESTION_CHARS,
            example_queries: defaults::example_queries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub api_key: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            cors_allowed_origins: Vec::new(),
            api_key: None,
        }
    }
}

impl RagSettings {
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(config.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn server_api_key(&self) -> Option<&str> {
        self.server
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = RagSettings::from_config(&json!({})).unwrap();

        assert_eq!(settings.corpus.dir, "warehouse/gemini");
        assert_eq!(settings.corpus.min_chunk_chars, 50);
        assert_eq!(settings.cache.checkpoint_interval, 100);
        assert_eq!(settings.cache.preview_chars, 200);
        assert_eq!(settings.embedding.max_input_chars, 10_000);
        assert_eq!(settings.query.default_max_results, 5);
        assert!(settings.gemini_api_key().is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = RagSettings::from_config(&json!({
            "cache": { "checkpoint_interval": 10 },
            "gemini": { "api_key": "  " },
            "server": { "port": 8080 }
        }))
        .unwrap();

        assert_eq!(settings.cache.checkpoint_interval, 10);
        assert_eq!(settings.cache.path, "config/embeddings_cache.json");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert!(settings.gemini_api_key().is_none());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result = RagSettings::from_config(&json!({ "cache": { "checkpoint_interval": "often" } }));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
