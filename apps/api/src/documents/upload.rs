use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::documents::extract::{
    decode_base64, extract_text, is_allowed_mime, INVALID_TYPE_MESSAGE, MAX_UPLOAD_BYTES,
};
use crate::errors::AppError;
use crate::models::document::Document;

/// JSON upload body. The file travels as base64, not multipart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub file_name: Option<String>,
    pub file_content: Option<String>,
    pub file_type: Option<String>,
    /// Declared size; the decoded length wins when they differ.
    pub file_size: Option<i64>,
    pub user_id: Option<String>,
}

/// A validated upload, ready to be persisted.
#[derive(Debug)]
pub struct PreparedUpload {
    pub document: Document,
    pub bytes: Vec<u8>,
}

/// Validates the request, decodes the payload and runs extraction.
///
/// `path` on the returned document is the local logical path; callers that
/// store the bytes elsewhere overwrite it.
pub async fn prepare_upload(
    request: UploadRequest,
    now: DateTime<Utc>,
) -> Result<PreparedUpload, AppError> {
    let (file_name, file_content, file_type) =
        match (request.file_name, request.file_content, request.file_type) {
            (Some(name), Some(content), Some(mime))
                if !name.trim().is_empty() && !content.is_empty() && !mime.is_empty() =>
            {
                (name, content, mime)
            }
            _ => return Err(AppError::Validation("Missing required fields".to_string())),
        };

    if !is_allowed_mime(&file_type) {
        return Err(AppError::Validation(INVALID_TYPE_MESSAGE.to_string()));
    }

    let bytes = decode_base64(&file_content)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File too large: {} bytes (limit {} bytes)",
            bytes.len(),
            MAX_UPLOAD_BYTES
        )));
    }

    let original_name = sanitize_file_name(&file_name);
    let stored_name = format!("{}-{}", now.timestamp_millis(), original_name);
    let extraction = extract_text(&original_name, bytes.clone()).await;

    let document = Document {
        id: Uuid::new_v4(),
        path: format!("uploads/{stored_name}"),
        name: stored_name,
        original_name,
        size: bytes.len() as i64,
        mime_type: file_type,
        uploaded_at: now,
        user_id: request.user_id.filter(|u| !u.trim().is_empty()),
        content: Some(extraction.content),
        extraction_warning: extraction.warning,
        is_vectorized: false,
        vectorized_at: None,
    };

    if let Some(declared) = request.file_size {
        if declared != document.size {
            tracing::debug!(
                "Declared size {declared} differs from decoded size {} for {}",
                document.size,
                document.original_name
            );
        }
    }

    Ok(PreparedUpload { document, bytes })
}

/// Drops any directory components and path separators from a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
        .trim();
    if base.is_empty() {
        "document".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, content: &str, mime: &str) -> UploadRequest {
        UploadRequest {
            file_name: Some(name.to_string()),
            file_content: Some(content.to_string()),
            file_type: Some(mime.to_string()),
            file_size: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_txt_upload_content_round_trips_exactly() {
        let prepared = prepare_upload(
            request("hello.txt", "SGVsbG8gd29ybGQ=", "text/plain"),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(prepared.document.content.as_deref(), Some("Hello world"));
        assert_eq!(prepared.document.size, 11);
        assert_eq!(prepared.bytes, b"Hello world");
    }

    #[tokio::test]
    async fn test_unsupported_mime_rejected() {
        let err = prepare_upload(request("a.png", "AAAA", "image/png"), Utc::now())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Invalid file type")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let mut req = request("a.txt", "", "text/plain");
        req.file_content = None;
        let err = prepare_upload(req, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Missing required fields"));
    }

    #[tokio::test]
    async fn test_stored_name_is_timestamp_prefixed_and_sanitized() {
        let now = Utc::now();
        let prepared = prepare_upload(
            request("../../etc/contract.txt", "SGk=", "text/plain"),
            now,
        )
        .await
        .unwrap();
        assert_eq!(prepared.document.original_name, "contract.txt");
        assert_eq!(
            prepared.document.name,
            format!("{}-contract.txt", now.timestamp_millis())
        );
    }
}
