use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::{ContractAnalysis, RiskLevel};

const TOP_CATEGORIES: usize = 5;
const RECENT_ANALYSES: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentAnalysis {
    pub document_id: Uuid,
    pub document_name: String,
    pub risk_score: RiskLevel,
    pub overall_score: u8,
    pub analyzed_at: DateTime<Utc>,
}

/// Portfolio-level risk aggregate shown on the contracts dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_contracts: usize,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    /// Mean of `overallScore`, one decimal place. 0 with no analyses.
    pub average_risk_score: f64,
    pub top_risk_categories: Vec<CategoryCount>,
    pub recent_analyses: Vec<RecentAnalysis>,
}

/// Reduces every stored analysis into the dashboard aggregate.
///
/// Categories are compared trimmed and case-insensitively; the first spelling
/// seen is the one reported. Ties in frequency are ordered by name.
pub fn build_dashboard(analyses: &[ContractAnalysis]) -> Dashboard {
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;
    let mut score_sum = 0u64;
    let mut categories: HashMap<String, CategoryCount> = HashMap::new();

    for analysis in analyses {
        match analysis.risk_score {
            RiskLevel::High => high += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::Low => low += 1,
        }
        score_sum += u64::from(analysis.risk_analysis.overall_score);

        for factor in &analysis.risk_analysis.risk_factors {
            let name = factor.category.trim();
            if name.is_empty() {
                continue;
            }
            categories
                .entry(name.to_lowercase())
                .or_insert_with(|| CategoryCount {
                    category: name.to_string(),
                    count: 0,
                })
                .count += 1;
        }
    }

    let average_risk_score = if analyses.is_empty() {
        0.0
    } else {
        (score_sum as f64 / analyses.len() as f64 * 10.0).round() / 10.0
    };

    let mut top_risk_categories: Vec<CategoryCount> = categories.into_values().collect();
    top_risk_categories.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.to_lowercase().cmp(&b.category.to_lowercase()))
    });
    top_risk_categories.truncate(TOP_CATEGORIES);

    let mut recent: Vec<&ContractAnalysis> = analyses.iter().collect();
    recent.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
    let recent_analyses = recent
        .into_iter()
        .take(RECENT_ANALYSES)
        .map(|a| RecentAnalysis {
            document_id: a.document_id,
            document_name: a.document_name.clone(),
            risk_score: a.risk_score,
            overall_score: a.risk_analysis.overall_score,
            analyzed_at: a.analyzed_at,
        })
        .collect();

    Dashboard {
        total_contracts: analyses.len(),
        high_risk_count: high,
        medium_risk_count: medium,
        low_risk_count: low,
        average_risk_score,
        top_risk_categories,
        recent_analyses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::analysis;

    #[test]
    fn test_empty_dashboard() {
        let dashboard = build_dashboard(&[]);
        assert_eq!(dashboard.total_contracts, 0);
        assert_eq!(dashboard.average_risk_score, 0.0);
        assert!(dashboard.top_risk_categories.is_empty());
        assert!(dashboard.recent_analyses.is_empty());
    }

    #[test]
    fn test_counts_always_sum_to_total() {
        let levels = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
        for n in 0..40usize {
            let fixtures: Vec<_> = (0..n)
                .map(|i| analysis(levels[(i * 7 + n) % 3], ((i * 13) % 101) as u8, &[], i as i64))
                .collect();
            let d = build_dashboard(&fixtures);
            assert_eq!(
                d.high_risk_count + d.medium_risk_count + d.low_risk_count,
                d.total_contracts
            );
            assert_eq!(d.total_contracts, n);
        }
    }

    #[test]
    fn test_average_rounded_to_one_decimal() {
        let fixtures = vec![
            analysis(RiskLevel::Low, 10, &[], 0),
            analysis(RiskLevel::Low, 20, &[], 0),
            analysis(RiskLevel::Medium, 41, &[], 0),
        ];
        // (10 + 20 + 41) / 3 = 23.666…
        assert_eq!(build_dashboard(&fixtures).average_risk_score, 23.7);
    }

    #[test]
    fn test_top_categories_by_frequency_then_name() {
        let fixtures = vec![
            analysis(RiskLevel::High, 80, &["Liability", "Payment", "Termination"], 0),
            analysis(RiskLevel::High, 70, &["liability ", "Payment"], 1),
            analysis(RiskLevel::Medium, 50, &["Liability", "Compliance", "Audit"], 2),
            analysis(RiskLevel::Low, 20, &["Confidentiality", "Zoning"], 3),
        ];
        let top = build_dashboard(&fixtures).top_risk_categories;
        let names: Vec<_> = top.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["Liability", "Payment", "Audit", "Compliance", "Confidentiality"]
        );
        assert_eq!(top[0].count, 3);
    }

    #[test]
    fn test_recent_analyses_newest_first_capped() {
        let fixtures: Vec<_> = (0..8)
            .map(|i| analysis(RiskLevel::Low, 5, &[], 100 - i))
            .collect();
        let recent = build_dashboard(&fixtures).recent_analyses;
        assert_eq!(recent.len(), 5);
        assert!(recent.windows(2).all(|w| w[0].analyzed_at >= w[1].analyzed_at));
        assert_eq!(recent[0].document_id, fixtures[7].document_id);
    }
}
