pub const CORPUS_DIR: &str = "warehouse/gemini";
pub const CORPUS_EXTENSION: &str = "md";
pub const MIN_CHUNK_CHARS: usize = 50;

pub const CACHE_PATH: &str = "config/embeddings_cache.json";
pub const CHECKPOINT_INTERVAL: usize = 100;
pub const PREVIEW_CHARS: usize = 200;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const EMBEDDING_MODEL: &str = "models/text-embedding-004";
pub const GENERATION_MODEL: &str = "gemini-2.0-flash-exp";
pub const MAX_EMBED_INPUT_CHARS: usize = 10_000;
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const MAX_RESULTS_CAP: usize = 20;
pub const MAX_QUESTION_CHARS: usize = 2_000;

pub const SERVER_HOST: &str = "127.0.0.1";
pub const SERVER_PORT: u16 = 5000;

pub fn example_queries() -> Vec<String> {
    [
        "What contamination problems have we dealt with?",
        "Which properties have the worst waste issues?",
        "What strategies work for negotiating with haulers?",
        "How do we typically handle billing disputes?",
        "What are common issues with compactor service?",
        "Which vendors are difficult to work with?",
        "What YPD issues have we seen at garden-style properties?",
        "Any discussions about DSQ monitoring?",
        "Contamination fee reduction strategies",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}
