use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{
    ContractAnalysis, ExecutiveSummary, KeyTerm, ProblematicClause, RiskAnalysis, RiskLevel,
};
use crate::models::document::{Document, DocumentChunk};
use crate::store::{AnalysisStore, DocumentStore};

/// PostgreSQL-backed store. Tables are created by `db::ensure_schema`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    id: Uuid,
    document_id: Uuid,
    document_name: String,
    risk_score: String,
    executive_summary: Json<ExecutiveSummary>,
    risk_analysis: Json<RiskAnalysis>,
    key_terms: Json<Vec<KeyTerm>>,
    problematic_clauses: Json<Vec<ProblematicClause>>,
    analyzed_at: DateTime<Utc>,
}

impl From<AnalysisRow> for ContractAnalysis {
    fn from(row: AnalysisRow) -> Self {
        let risk_analysis = row.risk_analysis.0;
        let risk_score = RiskLevel::parse(&row.risk_score)
            .unwrap_or_else(|| RiskLevel::from_score(risk_analysis.overall_score));
        ContractAnalysis {
            id: row.id,
            document_id: row.document_id,
            document_name: row.document_name,
            risk_score,
            executive_summary: row.executive_summary.0,
            risk_analysis,
            key_terms: row.key_terms.0,
            problematic_clauses: row.problematic_clauses.0,
            analyzed_at: row.analyzed_at,
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_document(&self, document: &Document) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO documents
                (id, name, original_name, size, mime_type, path, uploaded_at,
                 user_id, content, extraction_warning, is_vectorized, vectorized_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(document.id)
        .bind(&document.name)
        .bind(&document.original_name)
        .bind(document.size)
        .bind(&document.mime_type)
        .bind(&document.path)
        .bind(document.uploaded_at)
        .bind(&document.user_id)
        .bind(&document.content)
        .bind(&document.extraction_warning)
        .bind(document.is_vectorized)
        .bind(document.vectorized_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(
            sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_documents(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE id = ANY($1) ORDER BY uploaded_at DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_documents(&self, user_id: Option<&str>) -> Result<Vec<Document>, AppError> {
        Ok(sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE ($1::TEXT IS NULL OR user_id = $1)
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM document_chunks WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_content(&self, id: Uuid, content: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET content = $1, extraction_warning = NULL,
                is_vectorized = FALSE, vectorized_at = NULL
            WHERE id = $2
            "#,
        )
        .bind(content)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM document_chunks WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_vectorized(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE documents SET is_vectorized = TRUE, vectorized_at = $1 WHERE id = $2",
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO document_chunks
                    (document_id, chunk_index, content, start_char, end_char)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (document_id, chunk_index)
                DO UPDATE SET content = EXCLUDED.content,
                              start_char = EXCLUDED.start_char,
                              end_char = EXCLUDED.end_char
                "#,
            )
            .bind(chunk.document_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(chunk.start_char)
            .bind(chunk.end_char)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn clear_chunks(&self, document_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM document_chunks WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_chunks(&self, document_id: Uuid) -> Result<Vec<DocumentChunk>, AppError> {
        Ok(sqlx::query_as::<_, DocumentChunk>(
            r#"
            SELECT document_id, chunk_index, content, start_char, end_char
            FROM document_chunks
            WHERE document_id = $1
            ORDER BY chunk_index
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn find_analysis(&self, document_id: Uuid) -> Result<Option<ContractAnalysis>, AppError> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM contract_analyses WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContractAnalysis::from))
    }

    async fn insert_analysis_if_absent(
        &self,
        analysis: &ContractAnalysis,
    ) -> Result<ContractAnalysis, AppError> {
        // The UNIQUE(document_id) constraint makes the check-then-insert atomic.
        sqlx::query(
            r#"
            INSERT INTO contract_analyses
                (id, document_id, document_name, risk_score, executive_summary,
                 risk_analysis, key_terms, problematic_clauses, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (document_id) DO NOTHING
            "#,
        )
        .bind(analysis.id)
        .bind(analysis.document_id)
        .bind(&analysis.document_name)
        .bind(analysis.risk_score.as_str())
        .bind(Json(&analysis.executive_summary))
        .bind(Json(&analysis.risk_analysis))
        .bind(Json(&analysis.key_terms))
        .bind(Json(&analysis.problematic_clauses))
        .bind(analysis.analyzed_at)
        .execute(&self.pool)
        .await?;

        self.find_analysis(analysis.document_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "analysis for document {} vanished after insert",
                    analysis.document_id
                ))
            })
    }

    async fn list_analyses(&self) -> Result<Vec<ContractAnalysis>, AppError> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM contract_analyses ORDER BY analyzed_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ContractAnalysis::from).collect())
    }
}
