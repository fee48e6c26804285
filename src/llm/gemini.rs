use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::{EmbeddingProvider, GenerationProvider};
use super::types::EmbedMode;
use crate::core::config::RagSettings;
use crate::core::errors::ApiError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language API client, used for both embeddings and answers.
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    embed_client: Client,
    generate_client: Client,
}

impl GeminiProvider {
    pub fn new(
        base_url: &str,
        api_key: String,
        embedding_model: &str,
        generation_model: &str,
        embed_timeout: Duration,
        generate_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let embed_client = Client::builder()
            .timeout(embed_timeout)
            .build()
            .map_err(ApiError::internal)?;
        let generate_client = Client::builder()
            .timeout(generate_timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: qualified_model(embedding_model),
            generation_model: qualified_model(generation_model),
            embed_client,
            generate_client,
        })
    }

    pub fn from_settings(settings: &RagSettings, api_key: String) -> Result<Self, ApiError> {
        Self::new(
            &settings.gemini.base_url,
            api_key,
            &settings.embedding.model,
            &settings.generation.model,
            Duration::from_secs(settings.embedding.timeout_secs),
            Duration::from_secs(settings.generation.timeout_secs),
        )
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model, method)
    }
}

/// The REST API addresses models as `models/<id>`; config may omit the prefix.
fn qualified_model(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>, ApiError> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let body = json!({
            "model": self.embedding_model,
            "content": { "parts": [{ "text": text }] },
            "taskType": mode.task_type(),
        });

        let res = self
            .embed_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: EmbedContentResponse = res.json().await.map_err(ApiError::internal)?;
        Ok(payload
            .embedding
            .map(|embedding| embedding.values)
            .unwrap_or_default())
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&self.generation_model, "generateContent");
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let res = self
            .generate_client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "Gemini generation error ({}): {}",
                status, text
            )));
        }

        let payload: GenerateContentResponse = res.json().await.map_err(ApiError::internal)?;
        candidate_text(payload)
            .ok_or_else(|| ApiError::Internal("Gemini returned no answer text".to_string()))
    }
}

fn candidate_text(payload: GenerateContentResponse) -> Option<String> {
    let content = payload.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
