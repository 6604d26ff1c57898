mod chat;
mod config;
mod contracts;
mod db;
mod documents;
mod errors;
mod generator;
mod llm_client;
mod models;
mod ocr;
mod routes;
mod state;
mod store;
mod vectorize;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::contracts::coalesce::AnalysisLocks;
use crate::db::{create_pool, ensure_schema};
use crate::documents::blob::BlobStorage;
use crate::llm_client::LlmClient;
use crate::ocr::{HttpPageRecognizer, PageRecognizer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{AnalysisStore, DocumentStore, MemoryStore, PgStore};
use crate::vectorize::jobs::JobRegistry;
use crate::vectorize::sink::{BatchSink, HttpBatchSink, StoreBatchSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lexdesk API v{}", env!("CARGO_PKG_VERSION"));
    errors::hide_internal_details(config.is_production());

    // Initialize storage
    let (documents, analyses) = match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            let store = Arc::new(PgStore::new(pool));
            (
                store.clone() as Arc<dyn DocumentStore>,
                store as Arc<dyn AnalysisStore>,
            )
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (
                store.clone() as Arc<dyn DocumentStore>,
                store as Arc<dyn AnalysisStore>,
            )
        }
    };

    // Initialize S3 / MinIO
    let blobs = match &config.s3 {
        Some(s3) => {
            info!("S3 blob storage enabled (bucket: {})", s3.bucket);
            Some(BlobStorage::from_config(s3).await)
        }
        None => None,
    };

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.openai_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Vectorization batches go to the remote backend when configured, else to the chunk table
    let batch_sink: Arc<dyn BatchSink> = match &config.vector_backend_url {
        Some(url) => {
            info!("Vectorization batches will be sent to {url}");
            Arc::new(HttpBatchSink::new(url.clone()))
        }
        None => Arc::new(StoreBatchSink::new(documents.clone())),
    };

    let page_recognizer = config.ocr_backend_url.as_ref().map(|url| {
        info!("OCR backend configured at {url}");
        Arc::new(HttpPageRecognizer::new(url.clone())) as Arc<dyn PageRecognizer>
    });

    // Build app state
    let state = AppState {
        documents,
        analyses,
        llm,
        blobs,
        config: config.clone(),
        analysis_locks: Arc::new(AnalysisLocks::new()),
        vectorize_jobs: Arc::new(JobRegistry::new()),
        batch_sink,
        page_recognizer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
