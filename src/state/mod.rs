use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, ConfigService, RagSettings};
use crate::llm::LlmService;
use crate::rag::SemanticRag;

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
pub struct AppState {
    pub config: ConfigService,
    pub rag: Arc<SemanticRag>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Loads and validates configuration, connects the providers and opens
    /// the embedding cache.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(InitializationError::Config)?;
        let llm = LlmService::from_settings(&settings).map_err(InitializationError::Llm)?;
        let rag = SemanticRag::new(settings, &paths, llm);

        tracing::info!(
            "Engine ready: {} embeddings cached, corpus at {}",
            rag.cache().len().await,
            paths.resolve(&rag.settings().corpus.dir).display()
        );

        Ok(Self::from_parts(config, rag))
    }

    pub fn from_parts(config: ConfigService, rag: SemanticRag) -> Arc<Self> {
        Arc::new(Self {
            config,
            rag: Arc::new(rag),
            started_at: Utc::now(),
        })
    }

    pub fn settings(&self) -> &RagSettings {
        self.rag.settings()
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
