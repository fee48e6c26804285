//! Incrementally built embedding cache.
//!
//! Only chunks whose fingerprint is absent get embedded, unless a forced
//! rebuild is requested. Progress is checkpointed to disk while building, so
//! an interrupted build loses at most one checkpoint interval of work.

use std::collections::HashSet;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

use super::cache::{CacheContainer, CacheEntry, CachePersistence};
use super::chunk::{preview, Chunk};
use super::store::ChunkStore;
use crate::core::config::{AppPaths, RagSettings};
use crate::core::errors::ApiError;
use crate::llm::{EmbedMode, LlmService};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Chunks found by the corpus scan, duplicates included.
    pub total_chunks: usize,
    /// Unique fingerprints skipped because they were already cached.
    pub already_cached: usize,
    pub embedded_count: usize,
    pub error_count: usize,
    /// Cache size after the build.
    pub cached_total: usize,
}

/// Owns the in-memory container. Reads go through a shared lock; builds are
/// serialized by a separate gate and only take the write lock per insert.
pub struct EmbeddingCache {
    container: RwLock<CacheContainer>,
    build_gate: Mutex<()>,
    persistence: CachePersistence,
    preview_chars: usize,
    checkpoint_interval: usize,
}

impl EmbeddingCache {
    pub fn open(persistence: CachePersistence, preview_chars: usize, checkpoint_interval: usize) -> Self {
        let container = persistence.load();
        Self {
            container: RwLock::new(container),
            build_gate: Mutex::new(()),
            persistence,
            preview_chars,
            checkpoint_interval: checkpoint_interval.max(1),
        }
    }

    pub fn from_settings(settings: &RagSettings, paths: &AppPaths) -> Self {
        Self::open(
            CachePersistence::new(paths.resolve(&settings.cache.path)),
            settings.cache.preview_chars,
            settings.cache.checkpoint_interval,
        )
    }

    pub fn persistence(&self) -> &CachePersistence {
        &self.persistence
    }

    pub async fn len(&self) -> usize {
        self.container.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.container.read().await.is_empty()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, CacheContainer> {
        self.container.read().await
    }

    pub async fn save(&self) -> Result<(), ApiError> {
        let container = self.container.read().await;
        self.persistence.save(&container)
    }

    /// Embeds missing chunks (or every chunk when `force`), then saves.
    ///
    /// A chunk whose embedding fails is counted and skipped. Only a failed
    /// final save is reported as an error.
    pub async fn build(
        &self,
        store: &ChunkStore,
        llm: &LlmService,
        force: bool,
    ) -> Result<BuildReport, ApiError> {
        let _gate = self.build_gate.lock().await;

        let chunks = store.scan();
        let mut report = BuildReport {
            total_chunks: chunks.len(),
            ..Default::default()
        };

        if chunks.is_empty() {
            tracing::warn!(
                "No chunks found under {}; nothing to embed",
                store.corpus_dir().display()
            );
            report.cached_total = self.len().await;
            return Ok(report);
        }

        let to_embed = {
            let container = self.container.read().await;
            let mut seen = HashSet::new();
            let mut pending: Vec<Chunk> = Vec::new();
            for chunk in chunks {
                if !seen.insert(chunk.fingerprint.clone()) {
                    continue;
                }
                if !force && container.contains(&chunk.fingerprint) {
                    report.already_cached += 1;
                } else {
                    pending.push(chunk);
                }
            }
            pending
        };

        tracing::info!(
            "Embedding build: {} chunks scanned, {} to embed, {} already cached{}",
            report.total_chunks,
            to_embed.len(),
            report.already_cached,
            if force { " (forced rebuild)" } else { "" }
        );

        if to_embed.is_empty() {
            tracing::info!("All embeddings are up to date");
            report.cached_total = self.len().await;
            return Ok(report);
        }

        let pending_total = to_embed.len();
        for (index, chunk) in to_embed.into_iter().enumerate() {
            if index == 0 || (index + 1) % 10 == 0 {
                tracing::debug!("Embedding progress: {}/{}", index + 1, pending_total);
            }

            let Some(vector) = llm.embed(&chunk.content, EmbedMode::Document).await else {
                report.error_count += 1;
                continue;
            };

            let entry = CacheEntry {
                embedding: vector,
                source: chunk.source_batch,
                text_preview: preview(&chunk.content, self.preview_chars),
            };
            self.container.write().await.insert(chunk.fingerprint, entry);
            report.embedded_count += 1;

            if report.embedded_count % self.checkpoint_interval == 0 {
                if let Err(err) = self.save().await {
                    tracing::warn!("Checkpoint save failed, continuing build: {}", err);
                } else {
                    tracing::debug!("Checkpoint saved after {} embeddings", report.embedded_count);
                }
            }
        }

        self.save().await?;
        report.cached_total = self.len().await;

        tracing::info!(
            "Embedding complete: {} successful, {} errors, {} cached",
            report.embedded_count,
            report.error_count,
            report.cached_total
        );
        Ok(report)
    }
}
