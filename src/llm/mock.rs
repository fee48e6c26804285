//! In-process providers for tests: deterministic vectors, call counting and
//! failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::{EmbeddingProvider, GenerationProvider};
use super::types::EmbedMode;
use crate::core::errors::ApiError;

#[derive(Default)]
pub struct MockEmbedder {
    fixed: Vec<(String, Vec<f32>)>,
    fail_on: Vec<String>,
    empty_on: Vec<String>,
    document_calls: AtomicUsize,
    query_calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts containing `needle` embed to `vector`.
    pub fn with_vector(mut self, needle: &str, vector: Vec<f32>) -> Self {
        self.fixed.push((needle.to_string(), vector));
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    pub fn empty_on(mut self, needle: &str) -> Self {
        self.empty_on.push(needle.to_string());
        self
    }

    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn last_input_len(&self) -> Option<usize> {
        self.inputs
            .lock()
            .unwrap()
            .last()
            .map(|text| text.chars().count())
    }
}

/// Letter-frequency vector with a constant bias so no text maps to zero.
pub fn letter_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 27];
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() {
            vector[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    vector[26] = 1.0;
    vector
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>, ApiError> {
        match mode {
            EmbedMode::Document => self.document_calls.fetch_add(1, Ordering::SeqCst),
            EmbedMode::Query => self.query_calls.fetch_add(1, Ordering::SeqCst),
        };
        self.inputs.lock().unwrap().push(text.to_string());

        if self.fail_on.iter().any(|n| text.contains(n.as_str())) {
            return Err(ApiError::Internal("mock embedding failure".to_string()));
        }
        if self.empty_on.iter().any(|n| text.contains(n.as_str())) {
            return Ok(Vec::new());
        }
        if let Some((_, vector)) = self.fixed.iter().find(|(n, _)| text.contains(n.as_str())) {
            return Ok(vector.clone());
        }
        Ok(letter_vector(text))
    }
}

pub struct MockGenerator {
    answer: String,
    fail: bool,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if self.fail {
            return Err(ApiError::Internal("quota exceeded".to_string()));
        }
        Ok(self.answer.clone())
    }
}
