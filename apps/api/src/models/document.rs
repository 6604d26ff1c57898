use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded legal document and its extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    /// Storage name (`<timestamp>-<original name>`).
    pub name: String,
    pub original_name: String,
    pub size: i64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub content: Option<String>,
    /// Set when text extraction failed and `content` holds a placeholder.
    pub extraction_warning: Option<String>,
    pub is_vectorized: bool,
    pub vectorized_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Extracted text, or the empty string if nothing was stored.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// One overlapping window of a document's text, written by vectorization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub content: String,
    pub start_char: i32,
    pub end_char: i32,
}
