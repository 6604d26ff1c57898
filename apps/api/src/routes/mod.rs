pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::extract::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use crate::{chat, contracts, documents, generator, ocr, vectorize};

/// Base64 of the largest accepted upload plus room for the JSON envelope.
pub const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES.div_ceil(3) * 4 + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/test", get(health::test_handler))
        // Documents
        .route(
            "/api/documents",
            post(documents::handlers::handle_upload).get(documents::handlers::handle_list),
        )
        .route(
            "/api/documents/:id",
            get(documents::handlers::handle_get).delete(documents::handlers::handle_delete),
        )
        .route(
            "/api/documents/:id/vectorize",
            post(vectorize::handlers::handle_start)
                .get(vectorize::handlers::handle_progress)
                .delete(vectorize::handlers::handle_cancel),
        )
        .route("/api/documents/:id/ocr", post(ocr::handlers::handle_ocr))
        .route("/api/vectorize/batch", post(vectorize::handlers::handle_batch))
        // Chat
        .route("/api/chat", post(chat::handlers::handle_chat))
        // Contracts
        .route("/api/contracts", get(contracts::handlers::handle_list_analyses))
        .route(
            "/api/contracts/dashboard",
            get(contracts::handlers::handle_dashboard),
        )
        .route(
            "/api/contracts/analyze/:document_id",
            post(contracts::handlers::handle_analyze),
        )
        .route(
            "/api/contracts/analysis/:document_id",
            get(contracts::handlers::handle_get_analysis),
        )
        // Generator
        .route("/api/templates", get(generator::handlers::handle_list_templates))
        .route("/api/generate", post(generator::handlers::handle_generate))
        .route("/api/generate/pdf", post(generator::handlers::handle_pdf))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
