use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::chat::answer;
use crate::errors::{AppError, AppJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub document_count: usize,
    pub fallback: bool,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let documents = state.documents.get_documents(&request.document_ids).await?;
    info!(
        "Chat request with {}/{} documents resolved",
        documents.len(),
        request.document_ids.len()
    );

    let reply = answer(state.llm.as_ref(), &request.message, &documents).await;

    Ok(Json(ChatResponse {
        response: reply.text,
        document_count: documents.len(),
        fallback: reply.fallback,
    }))
}
