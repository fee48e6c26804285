//! Embedding cache container and its on-disk persistence.
//!
//! The container is a single JSON document:
//! `{"version": 2, "chunks": {"<fingerprint>": {"embedding": [...], "source": "...", "text_preview": "..."}}}`.
//! Entry order is preserved across save/load; similarity ties are broken by it.
//!
//! Version 2 keys entries by truncated SHA-256. Version 1 files (MD5 keys)
//! can never match a recomputed fingerprint, so they are set aside like any
//! other foreign version rather than merged.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

pub const CACHE_FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub embedding: Vec<f32>,
    /// Batch file the chunk was embedded from.
    pub source: String,
    pub text_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheContainer {
    pub version: u32,
    pub chunks: IndexMap<String, CacheEntry>,
}

impl Default for CacheContainer {
    fn default() -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            chunks: IndexMap::new(),
        }
    }
}

impl CacheContainer {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.chunks.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &str) -> Option<&CacheEntry> {
        self.chunks.get(fingerprint)
    }

    /// Overwrites in place, so a re-embedded fingerprint keeps its position.
    pub fn insert(&mut self, fingerprint: String, entry: CacheEntry) {
        self.chunks.insert(fingerprint, entry);
    }
}

#[derive(Debug, Clone)]
pub struct CachePersistence {
    path: PathBuf,
}

impl CachePersistence {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing, unreadable, malformed or foreign-version file
    /// yields an empty container. A foreign-version file is renamed to a
    /// `.v{N}.bak` sidecar first so the next save cannot clobber it.
    pub fn load(&self) -> CacheContainer {
        if !self.path.exists() {
            tracing::debug!("No embeddings cache at {}; starting empty", self.path.display());
            return CacheContainer::default();
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(
                    "Embeddings cache {} is unreadable, starting fresh: {}",
                    self.path.display(),
                    err
                );
                return CacheContainer::default();
            }
        };

        let container: CacheContainer = match serde_json::from_slice(&bytes) {
            Ok(container) => container,
            Err(err) => {
                tracing::warn!(
                    "Embeddings cache {} is corrupted, starting fresh: {}",
                    self.path.display(),
                    err
                );
                return CacheContainer::default();
            }
        };

        if container.version != CACHE_FORMAT_VERSION {
            let backup = self.backup_path(container.version);
            match fs::rename(&self.path, &backup) {
                Ok(()) => tracing::warn!(
                    "Embeddings cache {} has unsupported version {} (expected {}); moved to {}, starting fresh",
                    self.path.display(),
                    container.version,
                    CACHE_FORMAT_VERSION,
                    backup.display()
                ),
                Err(err) => tracing::warn!(
                    "Embeddings cache {} has unsupported version {} (expected {}) and could not be set aside: {}; starting fresh",
                    self.path.display(),
                    container.version,
                    CACHE_FORMAT_VERSION,
                    err
                ),
            }
            return CacheContainer::default();
        }

        tracing::info!("Loaded {} cached embeddings", container.len());
        container
    }

    /// Writes a sibling temp file and renames it over the cache, so a crash
    /// mid-save leaves the previous file intact.
    pub fn save(&self, container: &CacheContainer) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }

        let bytes = serde_json::to_vec(container).map_err(ApiError::internal)?;
        let tmp_path = self.tmp_path();
        {
            let mut file = File::create(&tmp_path).map_err(ApiError::internal)?;
            file.write_all(&bytes).map_err(ApiError::internal)?;
            file.sync_all().map_err(ApiError::internal)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            ApiError::internal(format!(
                "Failed to replace embeddings cache {}: {}",
                self.path.display(),
                err
            ))
        })?;

        tracing::debug!("Embeddings cache saved ({} chunks)", container.len());
        Ok(())
    }

    pub fn file_size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling_with_suffix(".tmp")
    }

    fn backup_path(&self, version: u32) -> PathBuf {
        self.sibling_with_suffix(&format!(".v{}.bak", version))
    }

    fn sibling_with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "embeddings_cache.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }
}
