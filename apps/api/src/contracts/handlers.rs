use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::contracts::analysis::analyze_document;
use crate::contracts::dashboard::{build_dashboard, Dashboard};
use crate::errors::AppError;
use crate::models::analysis::ContractAnalysis;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis: ContractAnalysis,
    pub cached: bool,
}

/// POST /api/contracts/analyze/:document_id
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let outcome = analyze_document(
        state.documents.as_ref(),
        state.analyses.as_ref(),
        state.llm.as_ref(),
        &state.analysis_locks,
        document_id,
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        analysis: outcome.analysis,
        cached: outcome.cached,
    }))
}

/// GET /api/contracts/analysis/:document_id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<ContractAnalysis>, AppError> {
    state
        .analyses
        .find_analysis(document_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No analysis found for document {document_id}")))
}

/// GET /api/contracts
pub async fn handle_list_analyses(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContractAnalysis>>, AppError> {
    Ok(Json(state.analyses.list_analyses().await?))
}

/// GET /api/contracts/dashboard
///
/// Full scan over every stored analysis; no pagination.
pub async fn handle_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    let analyses = state.analyses.list_analyses().await?;
    Ok(Json(build_dashboard(&analyses)))
}
