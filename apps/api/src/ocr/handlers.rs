use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::documents::extract::decode_base64;
use crate::errors::{AppError, AppJson};
use crate::ocr::{PageImage, ProgressiveOcr, MAX_PAGES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    pub pages: Vec<PageImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    pub document_id: Uuid,
    pub pages_processed: usize,
    pub characters: usize,
}

/// POST /api/documents/:id/ocr
///
/// Replaces the document's content with the recognised text.
pub async fn handle_ocr(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<OcrRequest>,
) -> Result<Json<OcrResponse>, AppError> {
    let recognizer = state
        .page_recognizer
        .clone()
        .ok_or_else(|| AppError::ServiceUnavailable("OCR backend is not configured".to_string()))?;

    if request.pages.is_empty() {
        return Err(AppError::Validation("At least one page is required".to_string()));
    }
    if request.pages.len() > MAX_PAGES {
        return Err(AppError::Validation(format!(
            "Too many pages: {} (limit {MAX_PAGES})",
            request.pages.len()
        )));
    }
    for (i, page) in request.pages.iter().enumerate() {
        if !page.mime_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Page {} must be an image, got '{}'",
                i + 1,
                page.mime_type
            )));
        }
        decode_base64(&page.image)?;
    }

    if state.documents.get_document(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Document {id} not found")));
    }

    let ocr = ProgressiveOcr::new(
        recognizer,
        Duration::from_millis(state.config.ocr_page_delay_ms),
    );
    let outcome = ocr
        .run(&request.pages, |done, total| {
            info!("OCR for document {id}: page {done}/{total}");
        })
        .await?;

    if !state.documents.set_content(id, &outcome.text).await? {
        return Err(AppError::NotFound(format!("Document {id} not found")));
    }

    Ok(Json(OcrResponse {
        document_id: id,
        pages_processed: outcome.pages_processed,
        characters: outcome.text.chars().count(),
    }))
}
