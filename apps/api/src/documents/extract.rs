//! Upload validation and text extraction.
//!
//! Extraction dispatches on the file extension. Plain text is decoded directly,
//! PDFs go through `pdf-extract` on the blocking pool, and Word files get a
//! placeholder until OCR or a later pass supplies real text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::errors::AppError;

/// MIME types accepted by the upload endpoint.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Decoded upload size cap.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const INVALID_TYPE_MESSAGE: &str =
    "Invalid file type. Only PDF, Word documents, and text files are allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
    Word,
    Other,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => DocumentKind::Text,
            "pdf" => DocumentKind::Pdf,
            "doc" | "docx" => DocumentKind::Word,
            _ => DocumentKind::Other,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DocumentKind::Text => "Text",
            DocumentKind::Pdf => "PDF",
            DocumentKind::Word => "Word",
            DocumentKind::Other => "Unsupported",
        }
    }
}

/// Result of running extraction over an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub content: String,
    /// Set when `content` is a placeholder because extraction failed.
    pub warning: Option<String>,
}

pub fn is_allowed_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Decodes a base64 payload, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, AppError> {
    let raw = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::Validation(format!("File content is not valid base64: {e}")))
}

fn placeholder(kind: DocumentKind, file_name: &str) -> String {
    format!(
        "[{} document: {}] Document content will be processed for analysis.",
        kind.label(),
        file_name
    )
}

/// Extracts text from decoded upload bytes.
///
/// Never fails: on error the placeholder is returned with a warning so the
/// document row can still be persisted.
pub async fn extract_text(file_name: &str, bytes: Vec<u8>) -> Extraction {
    let kind = DocumentKind::from_file_name(file_name);
    match kind {
        DocumentKind::Text => Extraction {
            content: String::from_utf8_lossy(&bytes).into_owned(),
            warning: None,
        },
        DocumentKind::Pdf => match extract_pdf(bytes).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Extracted {} characters from {file_name}", text.chars().count());
                Extraction {
                    content: text,
                    warning: None,
                }
            }
            Ok(_) => Extraction {
                content: placeholder(kind, file_name),
                warning: Some("PDF contained no extractable text; OCR may be required".into()),
            },
            Err(reason) => {
                warn!("PDF extraction failed for {file_name}: {reason}");
                Extraction {
                    content: placeholder(kind, file_name),
                    warning: Some(format!("Text extraction failed: {reason}")),
                }
            }
        },
        DocumentKind::Word | DocumentKind::Other => Extraction {
            content: placeholder(kind, file_name),
            warning: None,
        },
    }
}

/// Runs `pdf-extract` on the blocking pool. A panic inside the parser is
/// reported as an error rather than taking down the worker.
async fn extract_pdf(bytes: Vec<u8>) -> Result<String, String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| format!("PDF parser aborted: {e}"))?
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime_accepts_parameters_and_case() {
        assert!(is_allowed_mime("text/plain; charset=utf-8"));
        assert!(is_allowed_mime("Application/PDF"));
        assert!(!is_allowed_mime("image/png"));
        assert!(!is_allowed_mime(""));
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("notes.TXT"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_file_name("lease.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("nda.docx"), DocumentKind::Word);
        assert_eq!(DocumentKind::from_file_name("README"), DocumentKind::Other);
    }

    #[test]
    fn test_decode_base64_with_data_url_prefix() {
        let decoded = decode_base64("data:text/plain;base64,SGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(decoded, b"Hello world");
    }

    #[test]
    fn test_decode_base64_rejects_garbage() {
        assert!(matches!(
            decode_base64("not base64!!"),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_txt_extraction_is_exact() {
        let bytes = decode_base64("SGVsbG8gd29ybGQ=").unwrap();
        let extraction = extract_text("hello.txt", bytes).await;
        assert_eq!(extraction.content, "Hello world");
        assert!(extraction.warning.is_none());
    }

    #[tokio::test]
    async fn test_word_gets_placeholder() {
        let extraction = extract_text("nda.docx", vec![1, 2, 3]).await;
        assert!(extraction.content.contains("[Word document: nda.docx]"));
        assert!(extraction.warning.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_pdf_falls_back_with_warning() {
        let extraction = extract_text("broken.pdf", b"definitely not a pdf".to_vec()).await;
        assert!(extraction.content.starts_with("[PDF document: broken.pdf]"));
        assert!(extraction.warning.is_some());
    }
}
