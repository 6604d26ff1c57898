use std::sync::Arc;

use crate::config::Config;
use crate::contracts::coalesce::AnalysisLocks;
use crate::documents::blob::BlobStorage;
use crate::llm_client::ChatModel;
use crate::ocr::PageRecognizer;
use crate::store::{AnalysisStore, DocumentStore};
use crate::vectorize::jobs::JobRegistry;
use crate::vectorize::sink::BatchSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub analyses: Arc<dyn AnalysisStore>,
    pub llm: Arc<dyn ChatModel>,
    /// Original upload bytes. `None` when S3 is not configured.
    pub blobs: Option<BlobStorage>,
    pub config: Config,
    /// Per-document locks so concurrent analyze requests run the AI once.
    pub analysis_locks: Arc<AnalysisLocks>,
    pub vectorize_jobs: Arc<JobRegistry>,
    /// Where vectorization batches go: remote backend or the local chunk table.
    pub batch_sink: Arc<dyn BatchSink>,
    /// Page OCR backend. `None` when OCR_BACKEND_URL is not configured.
    pub page_recognizer: Option<Arc<dyn PageRecognizer>>,
}

#[cfg(test)]
impl AppState {
    /// State over a fresh `MemoryStore` with the given chat model.
    pub fn for_tests(llm: Arc<dyn ChatModel>) -> Self {
        use crate::store::MemoryStore;
        use crate::vectorize::sink::StoreBatchSink;

        let store = Arc::new(MemoryStore::new());
        AppState {
            documents: store.clone(),
            analyses: store.clone(),
            llm,
            blobs: None,
            config: Config::for_tests(),
            analysis_locks: Arc::new(AnalysisLocks::new()),
            vectorize_jobs: Arc::new(JobRegistry::new()),
            batch_sink: Arc::new(StoreBatchSink::new(store)),
            page_recognizer: None,
        }
    }
}
