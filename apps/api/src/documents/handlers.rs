use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::blob::BlobStorage;
use crate::documents::upload::{prepare_upload, UploadRequest};
use crate::errors::{AppError, AppJson};
use crate::models::document::Document;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub document: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/documents
pub async fn handle_upload(
    State(state): State<AppState>,
    AppJson(request): AppJson<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let prepared = prepare_upload(request, Utc::now()).await?;
    let mut document = prepared.document;

    if let Some(blobs) = &state.blobs {
        let key = BlobStorage::key_for(document.id, &document.name);
        blobs.put(&key, prepared.bytes, &document.mime_type).await?;
        document.path = key;
    }

    state.documents.insert_document(&document).await?;
    info!(
        "Stored document {} ({}, {} bytes)",
        document.id, document.original_name, document.size
    );

    let warning = document.extraction_warning.clone();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            document,
            warning,
        }),
    ))
}

/// GET /api/documents
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = state
        .documents
        .list_documents(query.user_id.as_deref())
        .await?;
    Ok(Json(documents))
}

/// GET /api/documents/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    state
        .documents
        .get_document(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}

/// DELETE /api/documents/:id
///
/// Analyses referencing the document are left in place.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let document = state
        .documents
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;

    state.vectorize_jobs.cancel(id).await;

    if !state.documents.delete_document(id).await? {
        return Err(AppError::NotFound(format!("Document {id} not found")));
    }

    if let Some(blobs) = &state.blobs {
        if let Err(e) = blobs.delete(&document.path).await {
            warn!("Document {id} deleted but its object was not: {e}");
        }
    }

    info!("Deleted document {id}");
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".to_string(),
    }))
}
