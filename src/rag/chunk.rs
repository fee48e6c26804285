//! Chunks: the retrievable units of the corpus.
//!
//! A batch file is a run of documents separated by [`CHUNK_DELIMITER`]. Each
//! trimmed segment is one chunk, identified by a fingerprint of its text.
//! Identical text in two places collapses to one fingerprint.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Eighty `=` characters, as written by the markdown batch exporter.
pub const CHUNK_DELIMITER: &str =
    "================================================================================";

/// Hex characters kept from the digest. Changing this invalidates every
/// persisted cache key, so it is tied to the cache format version.
pub const FINGERPRINT_HEX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub content: String,
    /// File name of the batch the chunk was read from.
    pub source_batch: String,
    pub fingerprint: String,
}

impl Chunk {
    pub fn new(content: String, source_batch: &str) -> Self {
        let fingerprint = fingerprint(&content);
        Self {
            content,
            source_batch: source_batch.to_string(),
            fingerprint,
        }
    }
}

pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}

/// Trimmed, non-empty segments of a batch with at least `min_chars` characters.
pub fn split_batch(text: &str, min_chars: usize) -> impl Iterator<Item = &str> {
    text.split(CHUNK_DELIMITER)
        .map(str::trim)
        .filter(move |segment| !segment.is_empty() && segment.chars().count() >= min_chars)
}

/// First `max_chars` characters of a chunk.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
