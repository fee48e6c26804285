//! Semantic retrieval over the batched email corpus.
//!
//! - `store`: reads batch files into fingerprinted chunks
//! - `cache` / `embedding_cache`: persisted vectors and the incremental build
//! - `ranker`: cosine and keyword ranking
//! - `engine`: the query state machine tying them together

pub mod cache;
pub mod chunk;
pub mod context_builder;
pub mod embedding_cache;
pub mod engine;
pub mod ranker;
pub mod store;

pub use embedding_cache::{BuildReport, EmbeddingCache};
pub use engine::{EngineStatus, FallbackReason, QueryResult, SearchOutcome, SearchType, SemanticRag};
pub use ranker::ScoredChunk;
