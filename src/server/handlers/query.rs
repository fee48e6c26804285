use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub question: Option<String>,
    pub max_chunks: Option<usize>,
    pub keyword_only: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub max_results: Option<usize>,
    pub keyword_only: bool,
}

pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_body(payload)?;
    let question = request
        .question
        .ok_or_else(|| ApiError::BadRequest("Missing required field: question".to_string()))?;
    let max_results = request
        .max_chunks
        .unwrap_or(state.settings().query.default_max_results);

    tracing::info!(
        "Processing query ({} mode)",
        if request.keyword_only { "keyword" } else { "semantic" }
    );
    let result = state
        .rag
        .query(&question, max_results, request.keyword_only)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "question": result.question,
        "answer": result.answer,
        "chunks_found": result.chunks_found,
        "search_type": result.search_type,
        "fallback_reason": result.fallback_reason,
        "error": result.error,
    })))
}

/// Ranked chunks only; no answer is generated.
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_body(payload)?;
    let query = request
        .query
        .ok_or_else(|| ApiError::BadRequest("Missing required field: query".to_string()))?;
    let max_results = request
        .max_results
        .unwrap_or(state.settings().query.default_max_results);

    let outcome = state
        .rag
        .search(&query, max_results, request.keyword_only)
        .await?;
    let search_type = outcome.search_type();
    let fallback_reason = outcome.fallback_reason();
    let results = outcome.into_chunks();

    Ok(Json(json!({
        "status": "success",
        "query": query,
        "search_type": search_type,
        "fallback_reason": fallback_reason,
        "count": results.len(),
        "results": results,
    })))
}
