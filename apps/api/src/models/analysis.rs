use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse risk label assigned by the analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Case-insensitive parse. Unknown labels yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }

    /// Label implied by a 0–100 numeric score.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=33 => RiskLevel::Low,
            34..=66 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutiveSummary {
    pub overview: String,
    pub key_dates: Vec<String>,
    pub obligations: Vec<String>,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskFactor {
    pub category: String,
    pub description: String,
    pub severity: String,
    pub clause: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskAnalysis {
    pub overall_score: u8,
    pub risk_factors: Vec<RiskFactor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
    pub importance: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblematicClause {
    pub clause: String,
    pub issue: String,
    pub suggestion: String,
    pub severity: Option<String>,
}

/// A persisted contract analysis. One per document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub id: Uuid,
    pub document_id: Uuid,
    pub document_name: String,
    pub risk_score: RiskLevel,
    pub executive_summary: ExecutiveSummary,
    pub risk_analysis: RiskAnalysis,
    pub key_terms: Vec<KeyTerm>,
    pub problematic_clauses: Vec<ProblematicClause>,
    pub analyzed_at: DateTime<Utc>,
}
