use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Idempotent schema, applied statement by statement at startup.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        original_name TEXT NOT NULL,
        size BIGINT NOT NULL,
        mime_type TEXT NOT NULL,
        path TEXT NOT NULL,
        uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        user_id TEXT,
        content TEXT,
        extraction_warning TEXT,
        is_vectorized BOOLEAN NOT NULL DEFAULT FALSE,
        vectorized_at TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_user_id_idx ON documents (user_id, uploaded_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS document_chunks (
        document_id UUID NOT NULL,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        start_char INTEGER NOT NULL,
        end_char INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (document_id, chunk_index)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contract_analyses (
        id UUID PRIMARY KEY,
        document_id UUID NOT NULL UNIQUE,
        document_name TEXT NOT NULL,
        risk_score TEXT NOT NULL,
        executive_summary JSONB NOT NULL,
        risk_analysis JSONB NOT NULL,
        key_terms JSONB NOT NULL,
        problematic_clauses JSONB NOT NULL,
        analyzed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .idle_timeout(std::time::Duration::from_secs(300))
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema statement")?;
    }
    info!("Database schema verified ({} statements)", SCHEMA.len());
    Ok(())
}
