use serde::{Deserialize, Serialize};

/// Which side of retrieval a text is embedded for.
///
/// Providers may place documents and queries in slightly different regions of
/// the vector space, so the two must not be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedMode {
    Document,
    Query,
}

impl EmbedMode {
    /// Task type understood by the Generative Language embedding endpoint.
    pub fn task_type(self) -> &'static str {
        match self {
            EmbedMode::Document => "RETRIEVAL_DOCUMENT",
            EmbedMode::Query => "RETRIEVAL_QUERY",
        }
    }
}
