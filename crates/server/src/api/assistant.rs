//! Single-shot, non-streaming completion.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use mammoth_llm::Message;

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub content: String,
}

/// `POST /api/assistant`: forward the messages as-is and return the reply.
pub async fn assistant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(provider) = state.completion.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("LLM is not configured (set OPENAI_API_KEY)")),
        ));
    };

    info!(messages = req.messages.len(), "assistant completion");
    let llm = &state.config.llm;
    match provider
        .complete(req.messages, llm.temperature, llm.max_tokens)
        .await
    {
        Ok(content) => Ok(Json(AssistantResponse { content })),
        Err(e) => {
            error!(error = %e, "assistant completion failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}
