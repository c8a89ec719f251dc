//! POST /api/chat — recommends professors for the latest message of a chat transcript.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use recommender::{ChatMessage, Query, RecommendOptions};
use tokio::time::Instant;
use tracing::debug;

use crate::{
    core::app_state::AppState, error_handler::AppResult,
    routes::chat::chat_response::ChatResponse,
};

/// Handler: POST /api/chat
///
/// Only the last message's `content` is used as the query.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/api/chat \
///   -H 'content-type: application/json' \
///   -d '[{"role":"user","content":"I want a lenient grader in computer science"}]'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<ChatMessage>>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(messages) = payload?;
    debug!(messages = messages.len(), "chat request received");

    let query = Query::from_messages(&messages)?;
    let opts = RecommendOptions {
        deadline: Some(Instant::now() + state.request_timeout),
    };

    let text = state.pipeline.recommend_with(&query, opts).await?;
    Ok(Json(ChatResponse { text }))
}
