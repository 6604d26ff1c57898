//! Persistence seam. Handlers and services only ever see these traits.
//!
//! `PgStore` backs production; `MemoryStore` backs local runs
//! (`STORAGE_BACKEND=memory`) and every async test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::ContractAnalysis;
use crate::models::document::{Document, DocumentChunk};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: &Document) -> Result<(), AppError>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Fetches the listed documents. Unknown ids are skipped.
    async fn get_documents(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError>;

    /// All documents, newest first, optionally filtered by owner.
    async fn list_documents(&self, user_id: Option<&str>) -> Result<Vec<Document>, AppError>;

    /// Deletes the document and its chunks. Returns false if it did not exist.
    async fn delete_document(&self, id: Uuid) -> Result<bool, AppError>;

    /// Replaces extracted text. Clears any extraction warning and discards
    /// vectorization state derived from the old text.
    async fn set_content(&self, id: Uuid, content: &str) -> Result<bool, AppError>;

    async fn mark_vectorized(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Upserts chunks keyed by `(document_id, chunk_index)`.
    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), AppError>;

    async fn clear_chunks(&self, document_id: Uuid) -> Result<(), AppError>;

    async fn list_chunks(&self, document_id: Uuid) -> Result<Vec<DocumentChunk>, AppError>;

    /// Cheap reachability probe for diagnostics.
    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn find_analysis(&self, document_id: Uuid) -> Result<Option<ContractAnalysis>, AppError>;

    /// Stores `analysis` unless one already exists for its document.
    /// Returns whichever row is stored afterwards.
    async fn insert_analysis_if_absent(
        &self,
        analysis: &ContractAnalysis,
    ) -> Result<ContractAnalysis, AppError>;

    /// All analyses, newest first.
    async fn list_analyses(&self) -> Result<Vec<ContractAnalysis>, AppError>;
}
