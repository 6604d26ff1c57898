//! Document generation: template wizard answers to prose, prose to PDF.
//!
//! Flow: validate answers → AI drafting → (on failure) template interpolation.
//! PDF rendering is a separate step over whatever text the client holds.

pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod pdf;
pub mod prompts;
pub mod templates;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generator::prompts::{GENERATION_PROMPT_TEMPLATE, GENERATION_SYSTEM};
use crate::generator::templates::Template;
use crate::llm_client::{ChatModel, CompletionOptions};

const GENERATION_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.4,
    max_tokens: 3000,
    json_mode: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedBy {
    Ai,
    Template,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub title: String,
    pub content: String,
    pub generated_by: GeneratedBy,
}

/// Strips markdown decoration models add despite instructions.
fn clean_generated_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_start_matches('#').trim_start().replace("**", ""))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Drafts `template` from `answers`. Missing required answers are a 400;
/// an AI failure falls back to the template body.
pub async fn generate(
    model: &dyn ChatModel,
    template: &Template,
    answers: &HashMap<String, String>,
) -> Result<GeneratedDocument, AppError> {
    let missing = template.missing_required(answers);
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required answers: {}",
            missing.join(", ")
        )));
    }

    let prompt = GENERATION_PROMPT_TEMPLATE
        .replace("{document_title}", template.title)
        .replace("{answers}", &template.answer_lines(answers));

    let drafted = match model.complete(GENERATION_SYSTEM, &prompt, GENERATION_OPTIONS).await {
        Ok(text) => Some(clean_generated_text(&text)).filter(|t| !t.is_empty()),
        Err(e) => {
            warn!("AI generation for '{}' failed, using template: {e}", template.id);
            None
        }
    };

    let (content, generated_by) = match drafted {
        Some(text) => (text, GeneratedBy::Ai),
        None => (template.render(answers), GeneratedBy::Template),
    };

    info!(
        "Generated '{}' via {:?} ({} chars)",
        template.id,
        generated_by,
        content.len()
    );

    Ok(GeneratedDocument {
        title: template.title.to_string(),
        content,
        generated_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::templates::find_template;
    use crate::llm_client::fake::FakeChatModel;

    fn nda_answers() -> HashMap<String, String> {
        [
            ("disclosing_party", "Acme Corp"),
            ("receiving_party", "Beta LLC"),
            ("purpose", "evaluating a joint venture"),
            ("effective_date", "January 5, 2026"),
            ("term_years", "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[tokio::test]
    async fn test_ai_draft_is_used_and_cleaned() {
        let model = FakeChatModel::replying("## NON-DISCLOSURE AGREEMENT\n\n**1. PURPOSE**\nAcme and Beta...");
        let nda = find_template("nda").unwrap();

        let doc = generate(&model, nda, &nda_answers()).await.unwrap();

        assert_eq!(doc.generated_by, GeneratedBy::Ai);
        assert_eq!(doc.title, "Non-Disclosure Agreement");
        assert!(doc.content.starts_with("NON-DISCLOSURE AGREEMENT\n\n1. PURPOSE"));
        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("- Disclosing party: Acme Corp"));
        assert!(prompt.contains("Draft a Non-Disclosure Agreement"));
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_template() {
        let model = FakeChatModel::failing();
        let nda = find_template("nda").unwrap();

        let doc = generate(&model, nda, &nda_answers()).await.unwrap();

        assert_eq!(doc.generated_by, GeneratedBy::Template);
        assert!(doc.content.contains("between Acme Corp (the \"Disclosing Party\")"));
        assert!(doc.content.contains("[Governing law (state or country)]"));
    }

    #[tokio::test]
    async fn test_blank_ai_reply_falls_back_to_template() {
        let model = FakeChatModel::replying("   \n  ");
        let nda = find_template("nda").unwrap();

        let doc = generate(&model, nda, &nda_answers()).await.unwrap();
        assert_eq!(doc.generated_by, GeneratedBy::Template);
    }

    #[tokio::test]
    async fn test_missing_required_answer_is_rejected_before_calling_model() {
        let model = FakeChatModel::replying("unused");
        let nda = find_template("nda").unwrap();
        let mut answers = nda_answers();
        answers.remove("purpose");

        let err = generate(&model, nda, &answers).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Purpose of the disclosure")));
        assert_eq!(model.calls(), 0);
    }
}
