//! Query orchestration over the chunk store, embedding cache and providers.
//!
//! Every query runs the same state machine: pick a ranking path, fall back to
//! keywords when the semantic path cannot run, bound the context window, and
//! hand it to the generator. Only caller input errors are returned as `Err`;
//! provider failures end up inside the returned [`QueryResult`].

use std::fmt;

use serde::Serialize;

use super::context_builder::{ContextBuilder, NO_DATA_ANSWER};
use super::embedding_cache::{BuildReport, EmbeddingCache};
use super::ranker::{rank_by_keywords, rank_by_similarity, ScoredChunk};
use super::store::ChunkStore;
use crate::core::config::{AppPaths, RagSettings};
use crate::core::errors::ApiError;
use crate::llm::{EmbedMode, LlmService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Semantic,
    Keyword,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Semantic => "semantic",
            SearchType::Keyword => "keyword",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a semantic request was answered from the keyword path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyCache,
    QueryEmbeddingFailed,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EmptyCache => f.write_str("no embeddings cached"),
            FallbackReason::QueryEmbeddingFailed => f.write_str("query embedding failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The requested path produced results.
    Found {
        search_type: SearchType,
        chunks: Vec<ScoredChunk>,
    },
    /// Semantic search was requested but keyword results were used instead.
    Degraded {
        reason: FallbackReason,
        chunks: Vec<ScoredChunk>,
    },
    Empty {
        search_type: SearchType,
        reason: Option<FallbackReason>,
    },
}

impl SearchOutcome {
    fn keyword(chunks: Vec<ScoredChunk>, reason: Option<FallbackReason>) -> Self {
        match (chunks.is_empty(), reason) {
            (true, reason) => SearchOutcome::Empty {
                search_type: SearchType::Keyword,
                reason,
            },
            (false, Some(reason)) => SearchOutcome::Degraded { reason, chunks },
            (false, None) => SearchOutcome::Found {
                search_type: SearchType::Keyword,
                chunks,
            },
        }
    }

    pub fn chunks(&self) -> &[ScoredChunk] {
        match self {
            SearchOutcome::Found { chunks, .. } | SearchOutcome::Degraded { chunks, .. } => {
                chunks.as_slice()
            }
            SearchOutcome::Empty { .. } => &[],
        }
    }

    pub fn into_chunks(self) -> Vec<ScoredChunk> {
        match self {
            SearchOutcome::Found { chunks, .. } | SearchOutcome::Degraded { chunks, .. } => chunks,
            SearchOutcome::Empty { .. } => Vec::new(),
        }
    }

    /// The path whose results were actually used.
    pub fn search_type(&self) -> SearchType {
        match self {
            SearchOutcome::Found { search_type, .. } | SearchOutcome::Empty { search_type, .. } => {
                *search_type
            }
            SearchOutcome::Degraded { .. } => SearchType::Keyword,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            SearchOutcome::Found { .. } => None,
            SearchOutcome::Degraded { reason, .. } => Some(*reason),
            SearchOutcome::Empty { reason, .. } => *reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    pub chunks_found: usize,
    pub search_type: SearchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fallback_reason: Option<FallbackReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub embeddings_cached: usize,
    pub cache_file_bytes: u64,
    pub batch_files: usize,
    pub corpus_bytes: u64,
    /// Path a non-keyword query would take right now.
    pub search_type: SearchType,
    pub embedding_model: String,
    pub generation_model: String,
}

pub struct SemanticRag {
    settings: RagSettings,
    store: ChunkStore,
    cache: EmbeddingCache,
    llm: LlmService,
}

impl SemanticRag {
    pub fn new(settings: RagSettings, paths: &AppPaths, llm: LlmService) -> Self {
        let store = ChunkStore::from_settings(&settings, paths);
        let cache = EmbeddingCache::from_settings(&settings, paths);
        Self::with_parts(settings, store, cache, llm)
    }

    pub fn with_parts(
        settings: RagSettings,
        store: ChunkStore,
        cache: EmbeddingCache,
        llm: LlmService,
    ) -> Self {
        Self {
            settings,
            store,
            cache,
            llm,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub async fn build_embeddings(&self, force: bool) -> Result<BuildReport, ApiError> {
        self.cache.build(&self.store, &self.llm, force).await
    }

    /// Ranked chunks for `query` without generating an answer.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
        keyword_only: bool,
    ) -> Result<SearchOutcome, ApiError> {
        let query = self.validate_question(query)?;
        let max_results = self.validate_max_results(max_results)?;
        Ok(self.run_search(query, max_results, keyword_only).await)
    }

    pub async fn query(
        &self,
        question: &str,
        max_results: usize,
        keyword_only: bool,
    ) -> Result<QueryResult, ApiError> {
        let question = self.validate_question(question)?;
        let max_results = self.validate_max_results(max_results)?;

        let outcome = self.run_search(question, max_results, keyword_only).await;
        let search_type = outcome.search_type();
        let fallback_reason = outcome.fallback_reason();

        let builder = ContextBuilder::new(max_results);
        let window = builder.build(outcome.chunks());
        if window.is_empty() {
            tracing::info!("No relevant chunks for query; skipping generation");
            return Ok(QueryResult {
                question: question.to_string(),
                answer: NO_DATA_ANSWER.to_string(),
                chunks_found: 0,
                search_type,
                error: None,
                fallback_reason,
            });
        }

        tracing::info!(
            "Generating answer from {} chunks ({} search)",
            window.chunk_count,
            search_type
        );
        let prompt = builder.prompt(question, &window);
        match self.llm.generate(&prompt).await {
            Ok(answer) => Ok(QueryResult {
                question: question.to_string(),
                answer,
                chunks_found: window.chunk_count,
                search_type,
                error: None,
                fallback_reason,
            }),
            Err(err) => {
                tracing::error!("Answer generation failed: {}", err);
                Ok(QueryResult {
                    question: question.to_string(),
                    answer: format!("Error: {}", err),
                    chunks_found: 0,
                    search_type,
                    error: Some(err.to_string()),
                    fallback_reason,
                })
            }
        }
    }

    pub async fn status(&self) -> EngineStatus {
        let embeddings_cached = self.cache.len().await;
        let corpus = self.store.stats();
        EngineStatus {
            embeddings_cached,
            cache_file_bytes: self.cache.persistence().file_size().unwrap_or(0),
            batch_files: corpus.batch_files,
            corpus_bytes: corpus.corpus_bytes,
            search_type: if embeddings_cached > 0 {
                SearchType::Semantic
            } else {
                SearchType::Keyword
            },
            embedding_model: self.settings.embedding.model.clone(),
            generation_model: self.settings.generation.model.clone(),
        }
    }

    async fn run_search(&self, query: &str, top_k: usize, keyword_only: bool) -> SearchOutcome {
        if keyword_only {
            return self.keyword_search(query, top_k, None);
        }

        if self.cache.is_empty().await {
            tracing::warn!("No embeddings cached; falling back to keyword search");
            return self.keyword_search(query, top_k, Some(FallbackReason::EmptyCache));
        }

        let Some(query_vector) = self.llm.embed(query, EmbedMode::Query).await else {
            tracing::warn!("Could not embed query; falling back to keyword search");
            return self.keyword_search(query, top_k, Some(FallbackReason::QueryEmbeddingFailed));
        };

        let chunks = {
            let cache = self.cache.read().await;
            if cache.is_empty() {
                drop(cache);
                tracing::warn!("No embeddings cached; falling back to keyword search");
                return self.keyword_search(query, top_k, Some(FallbackReason::EmptyCache));
            }
            rank_by_similarity(&query_vector, &cache, &self.store, top_k)
        };

        if chunks.is_empty() {
            SearchOutcome::Empty {
                search_type: SearchType::Semantic,
                reason: None,
            }
        } else {
            SearchOutcome::Found {
                search_type: SearchType::Semantic,
                chunks,
            }
        }
    }

    fn keyword_search(
        &self,
        query: &str,
        top_k: usize,
        reason: Option<FallbackReason>,
    ) -> SearchOutcome {
        let chunks = rank_by_keywords(query, self.store.scan_all(), top_k);
        tracing::debug!("Keyword search matched {} chunks", chunks.len());
        SearchOutcome::keyword(chunks, reason)
    }

    fn validate_question<'q>(&self, question: &'q str) -> Result<&'q str, ApiError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(ApiError::BadRequest("Question must not be empty".to_string()));
        }
        let limit = self.settings.query.max_question_chars;
        if trimmed.chars().count() > limit {
            return Err(ApiError::BadRequest(format!(
                "Question is too long (max {} characters)",
                limit
            )));
        }
        Ok(trimmed)
    }

    fn validate_max_results(&self, max_results: usize) -> Result<usize, ApiError> {
        let cap = self.settings.query.max_results_cap;
        if max_results == 0 || max_results > cap {
            return Err(ApiError::BadRequest(format!(
                "max_results must be between 1 and {}",
                cap
            )));
        }
        Ok(max_results)
    }
}
