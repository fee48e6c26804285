//! Context window and prompt assembly.
//!
//! The window is bounded by chunk count rather than characters: the caller's
//! `max_results` is already capped by configuration.

use super::ranker::ScoredChunk;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Fixed answer when neither ranking path found anything.
pub const NO_DATA_ANSWER: &str = "No relevant emails found for this query.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub text: String,
    pub chunk_count: usize,
}

impl ContextWindow {
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    max_chunks: usize,
}

impl ContextBuilder {
    pub fn new(max_chunks: usize) -> Self {
        Self { max_chunks }
    }

    /// Joins the first `max_chunks` chunks, in rank order.
    pub fn build(&self, chunks: &[ScoredChunk]) -> ContextWindow {
        let selected: Vec<&str> = chunks
            .iter()
            .take(self.max_chunks)
            .map(|chunk| chunk.content.as_str())
            .collect();
        ContextWindow {
            chunk_count: selected.len(),
            text: selected.join(CONTEXT_SEPARATOR),
        }
    }

    pub fn prompt(&self, question: &str, context: &ContextWindow) -> String {
        format!(
            "Based on the following email exchanges from our waste management correspondence, \
please answer this question:\n\n\
Question: {question}\n\n\
Email Context:\n{context}\n\n\
Please provide a comprehensive answer based on the emails above. \
Include specific details, names, and dates when available.",
            question = question,
            context = context.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            score,
            content: content.to_string(),
            source: "batch_001.md".to_string(),
            full_text: true,
        }
    }

    #[test]
    fn window_is_bounded_by_max_chunks() {
        let chunks: Vec<ScoredChunk> = (0..50)
            .map(|i| scored(&format!("email {}", i), 1.0))
            .collect();

        let window = ContextBuilder::new(5).build(&chunks);

        assert_eq!(window.chunk_count, 5);
        assert_eq!(window.text.matches(CONTEXT_SEPARATOR).count(), 4);
        assert!(window.text.starts_with("email 0"));
        assert!(window.text.ends_with("email 4"));
    }

    #[test]
    fn empty_input_gives_empty_window() {
        let window = ContextBuilder::new(5).build(&[]);
        assert!(window.is_empty());
        assert_eq!(window.text, "");
    }

    #[test]
    fn prompt_embeds_question_and_context() {
        let builder = ContextBuilder::new(2);
        let window = builder.build(&[scored("first email", 0.9), scored("second email", 0.8)]);

        let prompt = builder.prompt("Who raised the rate?", &window);

        assert!(prompt.contains("Question: Who raised the rate?"));
        assert!(prompt.contains("Email Context:\nfirst email\n\n---\n\nsecond email\n\n"));
        assert!(prompt.starts_with("Based on the following email exchanges"));
    }
}
