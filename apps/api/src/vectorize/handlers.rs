use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::state::AppState;
use crate::vectorize::pipeline::{Progress, StreamingVectorizer};
use crate::vectorize::sink::{store_batch, ChunkBatch};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorizeStarted {
    pub document_id: Uuid,
    pub estimated_chunks: usize,
    pub batch_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReceived {
    pub received: usize,
    pub is_final: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/documents/:id/vectorize
pub async fn handle_start(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<VectorizeStarted>), AppError> {
    let document = state
        .documents
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;

    let text = document.text().trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "Document has no content to vectorize".to_string(),
        ));
    }

    let vectorizer = StreamingVectorizer::new(
        state.batch_sink.clone(),
        Duration::from_millis(state.config.vectorize_batch_delay_ms),
    )
    .with_chunking(state.config.chunking)
    .with_batch_size(state.config.vectorize_batch_size);
    let batch_size = vectorizer.batch_size();
    let estimated_chunks = state
        .vectorize_jobs
        .start(id, text.to_string(), vectorizer)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(VectorizeStarted {
            document_id: id,
            estimated_chunks,
            batch_size,
        }),
    ))
}

/// GET /api/documents/:id/vectorize
pub async fn handle_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Progress>, AppError> {
    state
        .vectorize_jobs
        .progress(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No vectorization job for document {id}")))
}

/// DELETE /api/documents/:id/vectorize
///
/// Stops new batches from starting; the batch in flight completes.
pub async fn handle_cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.vectorize_jobs.cancel(id).await {
        return Err(AppError::NotFound(format!(
            "No vectorization job for document {id}"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Vectorization cancellation requested".to_string(),
    }))
}

/// POST /api/vectorize/batch
///
/// Receiving end of the batch protocol for clients that chunk on their side.
pub async fn handle_batch(
    State(state): State<AppState>,
    AppJson(batch): AppJson<ChunkBatch>,
) -> Result<Json<BatchReceived>, AppError> {
    if state.documents.get_document(batch.document_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Document {} not found",
            batch.document_id
        )));
    }

    store_batch(state.documents.as_ref(), &batch).await?;

    Ok(Json(BatchReceived {
        received: batch.chunks.len(),
        is_final: batch.is_final,
    }))
}
