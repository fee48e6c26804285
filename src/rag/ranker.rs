//! Ranking paths: cosine similarity over cached vectors, and the lexical
//! fallback that needs neither the cache nor an embedding provider.

use serde::Serialize;

use super::cache::CacheContainer;
use super::chunk::Chunk;
use super::store::ChunkStore;
use crate::vector_math::{cosine_similarity, sort_descending};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub score: f32,
    pub content: String,
    pub source: String,
    /// False when the batch was unavailable and only the cached preview is known.
    pub full_text: bool,
}

/// Scores every cached entry against `query_vector` and returns the best
/// `top_k`, highest first. Ties keep cache order.
///
/// Only the winners are resolved to full text, and each batch file is read at
/// most once per call.
pub fn rank_by_similarity(
    query_vector: &[f32],
    cache: &CacheContainer,
    store: &ChunkStore,
    top_k: usize,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<(f32, &String, _)> = cache
        .chunks
        .iter()
        .map(|(fp, entry)| (cosine_similarity(query_vector, &entry.embedding), fp, entry))
        .collect();
    sort_descending(&mut scored, |(score, _, _)| *score);

    let mut session = store.lookup_session();
    let mut ranked = Vec::with_capacity(top_k.min(scored.len()));
    for (score, fp, entry) in scored {
        if ranked.len() >= top_k {
            break;
        }
        let resolved = session.resolve(fp, entry);
        let full_text = resolved.is_full();
        let content = resolved.into_text();
        if content.is_empty() {
            continue;
        }
        ranked.push(ScoredChunk {
            score,
            content,
            source: entry.source.clone(),
            full_text,
        });
    }

    if let Some(top) = ranked.first() {
        tracing::debug!(
            "Similarity search scored {} chunks, top score {:.3}",
            cache.len(),
            top.score
        );
    }
    ranked
}

/// Lower-cased whitespace tokens longer than three characters.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|token| token.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

/// Scores each chunk by how many query keywords occur anywhere in its text.
///
/// Matching is plain substring containment, so "contam" matches
/// "contamination". Chunks scoring zero are dropped.
pub fn rank_by_keywords(query: &str, chunks: Vec<Chunk>, top_k: usize) -> Vec<ScoredChunk> {
    let keywords = extract_keywords(query);
    if keywords.is_empty() {
        tracing::debug!("Query {:?} has no usable keywords", query);
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let haystack = chunk.content.to_lowercase();
            let hits = keywords
                .iter()
                .filter(|kw| haystack.contains(kw.as_str()))
                .count();
            (hits > 0).then(|| ScoredChunk {
                score: hits as f32,
                content: chunk.content,
                source: chunk.source_batch,
                full_text: true,
            })
        })
        .collect();

    sort_descending(&mut scored, |chunk| chunk.score);
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::rag::cache::CacheEntry;
    use crate::rag::chunk::{fingerprint, CHUNK_DELIMITER};

    fn entry(vector: Vec<f32>, source: &str, preview: &str) -> CacheEntry {
        CacheEntry {
            embedding: vector,
            source: source.to_string(),
            text_preview: preview.to_string(),
        }
    }

    fn chunk(content: &str) -> Chunk {
        Chunk::new(content.to_string(), "batch_001.md")
    }

    #[test]
    fn keywords_drop_short_tokens_and_lowercase() {
        assert_eq!(
            extract_keywords("What is the WM Contamination fee?"),
            vec!["what".to_string(), "contamination".to_string(), "fee?".to_string()]
        );
        assert!(extract_keywords("a an the fee").is_empty());
    }

    #[test]
    fn single_invoice_chunk_is_sole_keyword_result() {
        let chunks = vec![chunk("Invoice from WM for contamination fee $450")];

        let ranked = rank_by_keywords("contamination fee", chunks, 5);

        // "fee" is three characters and never becomes a keyword.
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 1.0);
        assert_eq!(ranked[0].content, "Invoice from WM for contamination fee $450");
    }

    #[test]
    fn keyword_matching_is_substring_containment() {
        let chunks = vec![
            chunk("Recontamination of the recycling stream was reported."),
            chunk("Nothing relevant here at all."),
        ];

        let ranked = rank_by_keywords("contamination", chunks, 5);

        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].content.starts_with("Recontamination"));
    }

    #[test]
    fn keyword_ranking_orders_by_hits_and_keeps_scan_order_on_ties() {
        let chunks = vec![
            chunk("compactor only"),
            chunk("compactor repair invoice"),
            chunk("another compactor note"),
        ];

        let ranked = rank_by_keywords("compactor repair invoice", chunks, 10);
        let contents: Vec<&str> = ranked.iter().map(|c| c.content.as_str()).collect();

        assert_eq!(
            contents,
            vec!["compactor repair invoice", "compactor only", "another compactor note"]
        );
        assert_eq!(ranked[0].score, 3.0);
    }

    #[test]
    fn keyword_ranking_truncates_to_top_k() {
        let chunks = (0..50).map(|i| chunk(&format!("overage charge {}", i))).collect();

        let ranked = rank_by_keywords("overage", chunks, 5);

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].content, "overage charge 0");
    }

    #[test]
    fn identical_vectors_tie_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path().join("corpus"), "md", 50);
        let mut cache = CacheContainer::default();
        cache.insert("aaaaaaaaaaaaaaaa".to_string(), entry(vec![1.0, 0.0], "gone.md", "first"));
        cache.insert("0000000000000000".to_string(), entry(vec![1.0, 0.0], "gone.md", "second"));

        let ranked = rank_by_similarity(&[1.0, 0.0], &cache, &store, 5);

        assert_eq!(ranked.len(), 2);
        assert!((ranked[0].score - 1.0).abs() < 1e-6);
        assert!((ranked[1].score - 1.0).abs() < 1e-6);
        assert_eq!(ranked[0].content, "first");
        assert_eq!(ranked[1].content, "second");
    }

    #[test]
    fn similarity_ranks_descending_and_resolves_full_text() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        let near = "Subject: Bulk pickup\n\nThe bulk pickup at Maple Court moved to Tuesday afternoon.";
        let far = "Subject: Holiday schedule\n\nNo service on the holiday; routes shift by one day.";
        fs::write(
            corpus.join("batch_001.md"),
            format!("{}\n{}\n{}", near, CHUNK_DELIMITER, far),
        )
        .unwrap();
        let store = ChunkStore::new(corpus, "md", 50);

        let mut cache = CacheContainer::default();
        cache.insert(fingerprint(far), entry(vec![0.0, 1.0], "batch_001.md", "Subject: Holiday"));
        cache.insert(fingerprint(near), entry(vec![0.9, 0.1], "batch_001.md", "Subject: Bulk"));

        let ranked = rank_by_similarity(&[1.0, 0.0], &cache, &store, 1);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].content, near);
        assert!(ranked[0].full_text);
        assert_eq!(ranked[0].source, "batch_001.md");
    }

    #[test]
    fn similarity_falls_back_to_preview_when_batch_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path().to_path_buf(), "md", 50);
        let mut cache = CacheContainer::default();
        cache.insert(
            "1234567890abcdef".to_string(),
            entry(vec![0.5, 0.5], "batch_404.md", "Subject: Archived thread"),
        );

        let ranked = rank_by_similarity(&[0.5, 0.5], &cache, &store, 3);

        assert_eq!(ranked.len(), 1);
        assert!(!ranked[0].full_text);
        assert_eq!(ranked[0].content, "Subject: Archived thread");
    }

    #[test]
    fn zero_query_vector_scores_zero_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::new(dir.path().to_path_buf(), "md", 50);
        let mut cache = CacheContainer::default();
        cache.insert("1234567890abcdef".to_string(), entry(vec![0.3, 0.4], "x.md", "preview"));

        let ranked = rank_by_similarity(&[0.0, 0.0], &cache, &store, 3);

        assert_eq!(ranked[0].score, 0.0);
    }
}
