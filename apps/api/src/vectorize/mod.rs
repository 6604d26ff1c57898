//! Streaming vectorization: chunk a document's text and push it to the
//! vector backend in small, spaced-out batches.
//!
//! # Architecture
//! - `chunker` splits text into overlapping character windows.
//! - `pipeline::StreamingVectorizer` walks the batches strictly sequentially,
//!   sleeping between them so a memory-constrained backend is never flooded.
//! - `sink::BatchSink` is where batches go: `HttpBatchSink` (remote) or
//!   `StoreBatchSink` (local chunk table).
//! - `jobs::JobRegistry` runs one background job per document and exposes
//!   progress and cancellation to the handlers.

use thiserror::Error;

use crate::errors::AppError;

pub mod chunker;
pub mod handlers;
pub mod jobs;
pub mod pipeline;
pub mod sink;

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(String),

    #[error("Vectorization already running for document {0}")]
    AlreadyRunning(uuid::Uuid),

    #[error("Batch submission failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vector backend rejected batch {batch_index} (status {status}): {message}")]
    Rejected {
        batch_index: usize,
        status: u16,
        message: String,
    },

    #[error("Batch storage failed: {0}")]
    Store(String),
}

impl From<VectorizeError> for AppError {
    fn from(e: VectorizeError) -> Self {
        match e {
            VectorizeError::InvalidConfig(msg) => AppError::Validation(msg),
            VectorizeError::AlreadyRunning(id) => {
                AppError::Validation(format!("Vectorization already running for document {id}"))
            }
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}
