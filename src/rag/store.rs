//! Chunk store over the on-disk corpus.
//!
//! Batch files are re-read on every call; nothing here is cached across
//! operations, so edits to the corpus are visible to the next scan.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::cache::CacheEntry;
use super::chunk::{split_batch, Chunk};
use crate::core::config::{AppPaths, RagSettings};

#[derive(Debug, Clone)]
pub struct ChunkStore {
    corpus_dir: PathBuf,
    extension: String,
    min_chunk_chars: usize,
}

/// Full text re-derived from the corpus, or the cached preview when the
/// batch is gone or no longer contains the chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedText {
    Full(String),
    Preview(String),
}

impl ResolvedText {
    pub fn is_full(&self) -> bool {
        matches!(self, ResolvedText::Full(_))
    }

    pub fn into_text(self) -> String {
        match self {
            ResolvedText::Full(text) | ResolvedText::Preview(text) => text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusStats {
    pub batch_files: usize,
    pub corpus_bytes: u64,
}

impl ChunkStore {
    pub fn new(corpus_dir: PathBuf, extension: &str, min_chunk_chars: usize) -> Self {
        Self {
            corpus_dir,
            extension: extension.trim_start_matches('.').to_string(),
            min_chunk_chars,
        }
    }

    pub fn from_settings(settings: &RagSettings, paths: &AppPaths) -> Self {
        Self::new(
            paths.resolve(&settings.corpus.dir),
            &settings.corpus.extension,
            settings.corpus.min_chunk_chars,
        )
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Batch files in file-name order.
    pub fn batch_files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.corpus_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    "Corpus directory {} is not readable: {}",
                    self.corpus_dir.display(),
                    err
                );
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        files
    }

    /// Every embeddable chunk in the corpus.
    pub fn scan(&self) -> Vec<Chunk> {
        self.scan_with_min_chars(self.min_chunk_chars)
    }

    /// Every non-empty chunk, however short. Keyword search reads this view.
    pub fn scan_all(&self) -> Vec<Chunk> {
        self.scan_with_min_chars(1)
    }

    fn scan_with_min_chars(&self, min_chars: usize) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for path in self.batch_files() {
            if let Some(batch) = read_batch(&path, min_chars) {
                chunks.extend(batch);
            }
        }
        chunks
    }

    pub fn lookup(&self, chunk_fingerprint: &str, entry: &CacheEntry) -> ResolvedText {
        self.lookup_session().resolve(chunk_fingerprint, entry)
    }

    /// Lookup context that reads each batch file at most once.
    pub fn lookup_session(&self) -> LookupSession<'_> {
        LookupSession {
            store: self,
            batches: HashMap::new(),
        }
    }

    pub fn stats(&self) -> CorpusStats {
        let files = self.batch_files();
        let corpus_bytes = files
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum();
        CorpusStats {
            batch_files: files.len(),
            corpus_bytes,
        }
    }

    /// Path of a batch named in cache provenance. Only the file name is used,
    /// so provenance can never point outside the corpus directory.
    fn batch_path(&self, source_batch: &str) -> Option<PathBuf> {
        let name = Path::new(source_batch).file_name()?;
        Some(self.corpus_dir.join(name))
    }
}

pub struct LookupSession<'a> {
    store: &'a ChunkStore,
    /// batch name -> fingerprint -> content; `None` when the batch is unusable
    batches: HashMap<String, Option<HashMap<String, String>>>,
}

impl LookupSession<'_> {
    pub fn resolve(&mut self, chunk_fingerprint: &str, entry: &CacheEntry) -> ResolvedText {
        let store = self.store;
        let index = self
            .batches
            .entry(entry.source.clone())
            .or_insert_with(|| index_batch(store, &entry.source));

        match index.as_ref().and_then(|idx| idx.get(chunk_fingerprint)) {
            Some(content) => ResolvedText::Full(content.clone()),
            None => ResolvedText::Preview(entry.text_preview.clone()),
        }
    }
}

fn index_batch(store: &ChunkStore, source_batch: &str) -> Option<HashMap<String, String>> {
    let path = store.batch_path(source_batch)?;
    if !path.exists() {
        tracing::debug!("Batch {} is gone; serving cached previews", source_batch);
        return None;
    }
    let chunks = read_batch(&path, 1)?;
    Some(
        chunks
            .into_iter()
            .map(|chunk| (chunk.fingerprint, chunk.content))
            .collect(),
    )
}

fn read_batch(path: &Path, min_chars: usize) -> Option<Vec<Chunk>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Skipping unreadable batch {}: {}", path.display(), err);
            return None;
        }
    };

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    Some(
        split_batch(&content, min_chars)
            .map(|segment| Chunk::new(segment.to_string(), &source))
            .collect(),
    )
}
