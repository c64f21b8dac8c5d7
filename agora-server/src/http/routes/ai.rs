//! Chat completion endpoint

use std::sync::Arc;

use agora_services::ChatMessage;
use axum::{extract::State, routing::post, Json, Router};

use crate::http::error::ApiError;
use crate::models::ChatCompletionRequest;
use crate::state::AppState;

/// POST /v1/ai/chat-completion
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatCompletionRequest>,
) -> Result<Json<ChatMessage>, ApiError> {
    req.validate()?;
    let chat = state.chat.as_ref().ok_or(ApiError::Unavailable {
        service: "chat completion",
    })?;

    let message = chat.complete(&req.prompt, req.max_tokens).await?;
    Ok(Json(message))
}

/// AI routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/ai/chat-completion", post(chat_completion))
}
