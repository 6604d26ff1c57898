//! AI chat passthrough over the user's uploaded documents.
//!
//! Flow: load documents → build truncated context → one completion call →
//! append the disclaimer. A failed AI call degrades to a templated reply that
//! lists the uploaded documents instead of surfacing an error.

pub mod handlers;
pub mod prompts;

use tracing::warn;

use crate::chat::prompts::{CHAT_SYSTEM, CONTEXT_HEADER, MAX_CONTEXT_CHARS};
use crate::llm_client::prompts::LEGAL_DISCLAIMER;
use crate::llm_client::{ChatModel, CompletionOptions};
use crate::models::document::Document;

const CHAT_OPTIONS: CompletionOptions = CompletionOptions {
    temperature: 0.7,
    max_tokens: 1500,
    json_mode: false,
};

/// A chat answer and whether it came from the fallback template.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub fallback: bool,
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the user prompt: document context (if any) followed by the question.
pub fn build_prompt(message: &str, documents: &[Document]) -> String {
    let mut prompt = String::new();
    if !documents.is_empty() {
        prompt.push_str(CONTEXT_HEADER);
        prompt.push_str("\n\n");
        for doc in documents {
            prompt.push_str(&format!(
                "--- Document: {} ---\n{}\n\n",
                doc.original_name,
                truncate_chars(doc.text(), MAX_CONTEXT_CHARS)
            ));
        }
    }
    prompt.push_str("User question: ");
    prompt.push_str(message);
    prompt
}

/// Appends the disclaimer unless the reply already carries it.
pub fn ensure_disclaimer(reply: &str) -> String {
    if reply.contains(LEGAL_DISCLAIMER) {
        reply.to_string()
    } else {
        format!("{}\n\n{}", reply.trim_end(), LEGAL_DISCLAIMER)
    }
}

/// Templated reply used when the AI call fails.
pub fn fallback_reply(message: &str, documents: &[Document]) -> String {
    let mut text = format!(
        "I'm unable to reach the AI service right now, so I can't fully answer \"{}\".",
        message.trim()
    );
    if documents.is_empty() {
        text.push_str(" Upload a document and try again shortly.");
    } else {
        text.push_str(" Your uploaded documents are available for when it is back:\n");
        for doc in documents {
            text.push_str(&format!("- {}\n", doc.original_name));
        }
    }
    ensure_disclaimer(&text)
}

/// Answers `message` using `documents` as context.
pub async fn answer(model: &dyn ChatModel, message: &str, documents: &[Document]) -> ChatReply {
    let prompt = build_prompt(message, documents);
    match model.complete(CHAT_SYSTEM, &prompt, CHAT_OPTIONS).await {
        Ok(reply) => ChatReply {
            text: ensure_disclaimer(&reply),
            fallback: false,
        },
        Err(e) => {
            warn!("Chat completion failed, using fallback reply: {e}");
            ChatReply {
                text: fallback_reply(message, documents),
                fallback: true,
            }
        }
    }
}
