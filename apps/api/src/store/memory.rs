use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::ContractAnalysis;
use crate::models::document::{Document, DocumentChunk};
use crate::store::{AnalysisStore, DocumentStore};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Uuid, Document>>,
    chunks: RwLock<HashMap<Uuid, Vec<DocumentChunk>>>,
    analyses: RwLock<HashMap<Uuid, ContractAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: &Document) -> Result<(), AppError> {
        self.documents
            .write()
            .await
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn get_documents(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        let documents = self.documents.read().await;
        Ok(ids.iter().filter_map(|id| documents.get(id).cloned()).collect())
    }

    async fn list_documents(&self, user_id: Option<&str>) -> Result<Vec<Document>, AppError> {
        let mut list: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| user_id.map_or(true, |u| d.user_id.as_deref() == Some(u)))
            .cloned()
            .collect();
        newest_first(&mut list);
        Ok(list)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self.documents.write().await.remove(&id).is_some();
        self.chunks.write().await.remove(&id);
        Ok(removed)
    }

    async fn set_content(&self, id: Uuid, content: &str) -> Result<bool, AppError> {
        let mut documents = self.documents.write().await;
        Ok(match documents.get_mut(&id) {
            Some(doc) => {
                doc.content = Some(content.to_string());
                doc.extraction_warning = None;
                doc.is_vectorized = false;
                doc.vectorized_at = None;
                self.chunks.write().await.remove(&id);
                true
            }
            None => false,
        })
    }

    async fn mark_vectorized(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut documents = self.documents.write().await;
        Ok(match documents.get_mut(&id) {
            Some(doc) => {
                doc.is_vectorized = true;
                doc.vectorized_at = Some(at);
                true
            }
            None => false,
        })
    }

    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), AppError> {
        let mut all = self.chunks.write().await;
        for chunk in chunks {
            let stored = all.entry(chunk.document_id).or_default();
            match stored.iter_mut().find(|c| c.chunk_index == chunk.chunk_index) {
                Some(existing) => *existing = chunk.clone(),
                None => stored.push(chunk.clone()),
            }
            stored.sort_by_key(|c| c.chunk_index);
        }
        Ok(())
    }

    async fn clear_chunks(&self, document_id: Uuid) -> Result<(), AppError> {
        self.chunks.write().await.remove(&document_id);
        Ok(())
    }

    async fn list_chunks(&self, document_id: Uuid) -> Result<Vec<DocumentChunk>, AppError> {
        Ok(self
            .chunks
            .read()
            .await
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn find_analysis(&self, document_id: Uuid) -> Result<Option<ContractAnalysis>, AppError> {
        Ok(self.analyses.read().await.get(&document_id).cloned())
    }

    async fn insert_analysis_if_absent(
        &self,
        analysis: &ContractAnalysis,
    ) -> Result<ContractAnalysis, AppError> {
        let mut analyses = self.analyses.write().await;
        Ok(analyses
            .entry(analysis.document_id)
            .or_insert_with(|| analysis.clone())
            .clone())
    }

    async fn list_analyses(&self) -> Result<Vec<ContractAnalysis>, AppError> {
        let mut list: Vec<ContractAnalysis> =
            self.analyses.read().await.values().cloned().collect();
        list.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(list)
    }
}

#[cfg(test)]
pub mod fixtures {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::models::analysis::{
        ContractAnalysis, ExecutiveSummary, RiskAnalysis, RiskFactor, RiskLevel,
    };
    use crate::models::document::Document;

    pub fn document(name: &str, content: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            name: format!("1700000000000-{name}"),
            original_name: name.to_string(),
            size: content.len() as i64,
            mime_type: "text/plain".to_string(),
            path: format!("uploads/{name}"),
            uploaded_at: Utc::now(),
            user_id: None,
            content: Some(content.to_string()),
            extraction_warning: None,
            is_vectorized: false,
            vectorized_at: None,
        }
    }

    pub fn analysis(level: RiskLevel, score: u8, categories: &[&str], age_minutes: i64) -> ContractAnalysis {
        ContractAnalysis {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            document_name: "contract.txt".to_string(),
            risk_score: level,
            executive_summary: ExecutiveSummary::default(),
            risk_analysis: RiskAnalysis {
                overall_score: score,
                risk_factors: categories
                    .iter()
                    .map(|c| RiskFactor {
                        category: c.to_string(),
                        description: format!("{c} risk"),
                        severity: "medium".to_string(),
                        clause: None,
                    })
                    .collect(),
            },
            key_terms: vec![],
            problematic_clauses: vec![],
            analyzed_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }
}
