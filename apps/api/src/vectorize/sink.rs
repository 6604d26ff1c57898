use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::document::DocumentChunk;
use crate::store::DocumentStore;
use crate::vectorize::chunker::TextChunk;
use crate::vectorize::VectorizeError;

/// Wire format of one batch, shared by the HTTP sink and `POST /api/vectorize/batch`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkBatch {
    pub document_id: Uuid,
    pub batch_index: usize,
    pub chunks: Vec<TextChunk>,
    pub is_final: bool,
}

/// Destination for vectorization batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn submit(&self, batch: &ChunkBatch) -> Result<(), VectorizeError>;
}

/// POSTs each batch as JSON to a remote vector backend.
pub struct HttpBatchSink {
    client: Client,
    url: String,
}

impl HttpBatchSink {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }
}

#[async_trait]
impl BatchSink for HttpBatchSink {
    async fn submit(&self, batch: &ChunkBatch) -> Result<(), VectorizeError> {
        let response = self.client.post(&self.url).json(batch).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VectorizeError::Rejected {
                batch_index: batch.batch_index,
                status: status.as_u16(),
                message,
            });
        }
        debug!(
            "Batch {} for document {} accepted by {}",
            batch.batch_index, batch.document_id, self.url
        );
        Ok(())
    }
}

/// Writes batches into the local chunk table.
pub struct StoreBatchSink {
    store: Arc<dyn DocumentStore>,
}

impl StoreBatchSink {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BatchSink for StoreBatchSink {
    async fn submit(&self, batch: &ChunkBatch) -> Result<(), VectorizeError> {
        store_batch(self.store.as_ref(), batch)
            .await
            .map_err(|e| VectorizeError::Store(e.to_string()))
    }
}

fn to_row(document_id: Uuid, chunk: &TextChunk) -> Result<DocumentChunk, AppError> {
    let as_i32 = |v: usize| {
        i32::try_from(v).map_err(|_| AppError::Validation(format!("Chunk offset {v} out of range")))
    };
    Ok(DocumentChunk {
        document_id,
        chunk_index: as_i32(chunk.index)?,
        content: chunk.text.clone(),
        start_char: as_i32(chunk.start_char)?,
        end_char: as_i32(chunk.end_char)?,
    })
}

/// Persists a batch and, on the final one, flags the document as vectorized.
/// The first batch of a run replaces whatever chunks a previous run left.
pub async fn store_batch(store: &dyn DocumentStore, batch: &ChunkBatch) -> Result<(), AppError> {
    let rows = batch
        .chunks
        .iter()
        .map(|c| to_row(batch.document_id, c))
        .collect::<Result<Vec<_>, _>>()?;
    if batch.batch_index == 0 {
        store.clear_chunks(batch.document_id).await?;
    }
    store.insert_chunks(&rows).await?;

    if batch.is_final {
        if !store.mark_vectorized(batch.document_id, Utc::now()).await? {
            return Err(AppError::NotFound(format!(
                "Document {} not found",
                batch.document_id
            )));
        }
        info!("Document {} vectorized", batch.document_id);
    }
    Ok(())
}
