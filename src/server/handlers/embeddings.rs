use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    pub force: bool,
}

pub async fn build_embeddings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, state.settings().server_api_key())?;
    let request = parse_build_request(&body)?;

    tracing::info!("Building embeddings (force={})", request.force);
    let report = state.rag.build_embeddings(request.force).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Embeddings built successfully",
        "chunks_embedded": report.embedded_count,
        "errors": report.error_count,
        "embeddings_cached": report.cached_total,
        "report": report,
    })))
}

/// An empty body means an incremental build.
fn parse_build_request(body: &[u8]) -> Result<BuildRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BuildRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.rag.status().await;
    Json(json!({
        "status": "success",
        "started_at": state.started_at.to_rfc3339(),
        "stats": status,
    }))
}
