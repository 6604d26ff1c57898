use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "lexdesk-api"
    }))
}

/// GET /api/test
/// Diagnostic: environment, storage reachability and whether the AI key is set.
pub async fn test_handler(State(state): State<AppState>) -> Json<Value> {
    let reachable = match state.documents.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Storage ping failed: {e}");
            false
        }
    };

    Json(json!({
        "message": "API is working",
        "timestamp": Utc::now(),
        "environment": state.config.app_env,
        "storage": {
            "backend": state.config.storage_backend.as_str(),
            "reachable": reachable
        },
        "openaiConfigured": !state.config.openai_api_key.trim().is_empty()
    }))
}
