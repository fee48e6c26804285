use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub const SERVICE_NAME: &str = "WASTE Master Brain Semantic RAG";

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.rag.status().await;
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "search_type": status.search_type,
        "embeddings_cached": status.embeddings_cached,
        "uptime_secs": state.uptime_secs(),
    }))
}
