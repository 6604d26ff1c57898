//! Contract analysis: cache-aside over the analysis store.
//!
//! Flow: stored analysis? → return it. Otherwise take the per-document lock,
//! re-check, load the document, call the AI once, normalise, insert-if-absent.
//! The lock plus the unique insert guarantee at most one AI call and one row
//! per document even under concurrent requests.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::chat::truncate_chars;
use crate::contracts::coalesce::AnalysisLocks;
use crate::contracts::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::{complete_json, ChatModel, CompletionOptions};
use crate::models::analysis::{
    ContractAnalysis, ExecutiveSummary, KeyTerm, ProblematicClause, RiskAnalysis, RiskFactor,
    RiskLevel,
};
use crate::models::document::Document;
use crate::store::{AnalysisStore, DocumentStore};

/// Documents shorter than this (after trimming) are rejected.
pub const MIN_CONTENT_CHARS: usize = 50;
/// Contract text sent to the model is capped at this many characters.
pub const MAX_ANALYSIS_CHARS: usize = 12_000;

const ANALYSIS_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.2,
    max_tokens: 3000,
    json_mode: true,
};

/// The analysis and whether it was already stored before this call.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: ContractAnalysis,
    pub cached: bool,
}

/// Shape the model returns. Every field is optional so a partial answer still lands.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAnalysis {
    risk_score: Option<String>,
    executive_summary: ExecutiveSummary,
    risk_analysis: RawRiskAnalysis,
    key_terms: Vec<KeyTerm>,
    problematic_clauses: Vec<ProblematicClause>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRiskAnalysis {
    overall_score: f64,
    risk_factors: Vec<RiskFactor>,
}

impl RawAnalysis {
    fn into_analysis(self, document: &Document, analyzed_at: DateTime<Utc>) -> ContractAnalysis {
        let overall_score = clamp_score(self.risk_analysis.overall_score);
        let risk_score = self
            .risk_score
            .as_deref()
            .and_then(RiskLevel::parse)
            .unwrap_or_else(|| RiskLevel::from_score(overall_score));

        ContractAnalysis {
            id: Uuid::new_v4(),
            document_id: document.id,
            document_name: document.original_name.clone(),
            risk_score,
            executive_summary: self.executive_summary,
            risk_analysis: RiskAnalysis {
                overall_score,
                risk_factors: self.risk_analysis.risk_factors,
            },
            key_terms: self.key_terms,
            problematic_clauses: self.problematic_clauses,
            analyzed_at,
        }
    }
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

/// Fills the analysis template. Placeholders inside the file name or the
/// contract text are left as written.
pub fn build_analysis_prompt(document: &Document) -> String {
    let name = document.original_name.as_str();
    let text = truncate_chars(document.text().trim(), MAX_ANALYSIS_CHARS);
    match ANALYSIS_PROMPT_TEMPLATE.split_once("{contract_text}") {
        Some((head, tail)) => format!(
            "{}{}{}",
            head.replace("{document_name}", name),
            text,
            tail.replace("{document_name}", name)
        ),
        None => ANALYSIS_PROMPT_TEMPLATE.replace("{document_name}", name),
    }
}

/// Returns the stored analysis for `document_id`, running the AI only if none exists.
pub async fn analyze_document(
    documents: &dyn DocumentStore,
    analyses: &dyn AnalysisStore,
    model: &dyn ChatModel,
    locks: &AnalysisLocks,
    document_id: Uuid,
) -> Result<AnalysisOutcome, AppError> {
    if let Some(analysis) = analyses.find_analysis(document_id).await? {
        return Ok(AnalysisOutcome {
            analysis,
            cached: true,
        });
    }

    let _guard = locks.acquire(document_id).await;

    // Another request may have finished the analysis while we waited.
    if let Some(analysis) = analyses.find_analysis(document_id).await? {
        return Ok(AnalysisOutcome {
            analysis,
            cached: true,
        });
    }

    let document = documents
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {document_id} not found")))?;

    if document.text().trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(AppError::Validation(
            "Document content is too short for analysis".to_string(),
        ));
    }

    info!("Analyzing document {} ({})", document.id, document.original_name);
    let prompt = build_analysis_prompt(&document);
    let raw: RawAnalysis = complete_json(model, ANALYSIS_SYSTEM, &prompt, ANALYSIS_OPTIONS).await?;
    let analysis = raw.into_analysis(&document, Utc::now());

    let stored = analyses.insert_analysis_if_absent(&analysis).await?;
    let cached = stored.id != analysis.id;
    info!(
        "Analysis for document {} stored: risk={} score={}",
        document.id,
        stored.risk_score.as_str(),
        stored.risk_analysis.overall_score
    );

    Ok(AnalysisOutcome {
        analysis: stored,
        cached,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::fake::FakeChatModel;
    use crate::store::memory::fixtures;
    use crate::store::MemoryStore;

    const MODEL_REPLY: &str = r#"{
        "riskScore": "high",
        "executiveSummary": {"overview": "One-sided supply deal.", "keyDates": ["Jan 1"]},
        "riskAnalysis": {"overallScore": 120.4, "riskFactors": [{"category": "Liability", "description": "Uncapped", "severity": "high"}]},
        "keyTerms": [{"term": "Indemnity", "definition": "Covers losses"}],
        "problematicClauses": []
    }"#;

    fn contract_text() -> String {
        "The Supplier shall indemnify the Buyer against all losses without limit. ".repeat(3)
    }

    #[tokio::test]
    async fn test_second_call_is_cached_and_skips_model() {
        let store = MemoryStore::new();
        let model = FakeChatModel::replying(MODEL_REPLY);
        let locks = AnalysisLocks::new();
        let doc = fixtures::document("supply.txt", &contract_text());
        store.insert_document(&doc).await.unwrap();

        let first = analyze_document(&store, &store, &model, &locks, doc.id)
            .await
            .unwrap();
        let second = analyze_document(&store, &store, &model, &locks, doc.id)
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.analysis, second.analysis);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_call_model_once() {
        let store = Arc::new(MemoryStore::new());
        let model = Arc::new(FakeChatModel::replying(MODEL_REPLY));
        let locks = Arc::new(AnalysisLocks::new());
        let doc = fixtures::document("supply.txt", &contract_text());
        store.insert_document(&doc).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let (store, model, locks) = (store.clone(), model.clone(), locks.clone());
                tokio::spawn(async move {
                    analyze_document(store.as_ref(), store.as_ref(), model.as_ref(), &locks, doc.id)
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().analysis.id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(model.calls(), 1);
        assert_eq!(store.list_analyses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_short_content_rejected_without_model_call() {
        let store = MemoryStore::new();
        let model = FakeChatModel::replying(MODEL_REPLY);
        let doc = fixtures::document("tiny.txt", "   too short   ");
        store.insert_document(&doc).await.unwrap();

        let err = analyze_document(&store, &store, &model, &AnalysisLocks::new(), doc.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let model = FakeChatModel::replying(MODEL_REPLY);
        let err = analyze_document(&store, &store, &model, &AnalysisLocks::new(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_model_output_is_normalised() {
        let store = MemoryStore::new();
        let model = FakeChatModel::replying(MODEL_REPLY);
        let doc = fixtures::document("supply.txt", &contract_text());
        store.insert_document(&doc).await.unwrap();

        let outcome = analyze_document(&store, &store, &model, &AnalysisLocks::new(), doc.id)
            .await
            .unwrap();
        let analysis = outcome.analysis;
        assert_eq!(analysis.risk_score, RiskLevel::High);
        assert_eq!(analysis.risk_analysis.overall_score, 100);
        assert_eq!(analysis.document_name, "supply.txt");
        assert_eq!(analysis.executive_summary.key_dates, vec!["Jan 1"]);
        assert!(analysis.executive_summary.obligations.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_llm_error_and_nothing_stored() {
        let store = MemoryStore::new();
        let model = FakeChatModel::failing();
        let doc = fixtures::document("supply.txt", &contract_text());
        store.insert_document(&doc).await.unwrap();

        let err = analyze_document(&store, &store, &model, &AnalysisLocks::new(), doc.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
        assert!(store.find_analysis(doc.id).await.unwrap().is_none());
    }

    #[test]
    fn test_missing_risk_label_derived_from_score() {
        let raw = RawAnalysis {
            risk_analysis: RawRiskAnalysis {
                overall_score: 45.0,
                risk_factors: vec![],
            },
            ..Default::default()
        };
        let doc = fixtures::document("x.txt", "x");
        assert_eq!(raw.into_analysis(&doc, Utc::now()).risk_score, RiskLevel::Medium);
    }

    #[test]
    fn test_prompt_embeds_truncated_text() {
        let doc = fixtures::document("big.txt", &"b".repeat(MAX_ANALYSIS_CHARS + 500));
        let prompt = build_analysis_prompt(&doc);
        assert!(prompt.contains("\"big.txt\""));
        assert!(!prompt.contains(&"b".repeat(MAX_ANALYSIS_CHARS + 1)));
    }

    #[test]
    fn test_placeholder_in_file_name_is_not_expanded() {
        let doc = fixtures::document("{contract_text}.txt", "The tenant pays rent monthly.");
        let prompt = build_analysis_prompt(&doc);
        assert_eq!(prompt.matches("The tenant pays rent monthly.").count(), 1);
        assert!(prompt.contains("\"{contract_text}.txt\""));
    }
}
