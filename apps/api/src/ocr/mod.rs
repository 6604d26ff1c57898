//! Progressive OCR: recognise a scanned document one page at a time.
//!
//! Pages are sent strictly in order with a pause between them, so the OCR
//! backend never holds more than one page in memory on our behalf.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::AppError;

pub mod handlers;

/// Upper bound on pages accepted in one request.
pub const MAX_PAGES: usize = 200;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR backend rejected page {page} (status {status}): {message}")]
    Rejected {
        page: usize,
        status: u16,
        message: String,
    },
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

/// One rendered page, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImage {
    pub image: String,
    pub mime_type: String,
}

#[async_trait]
pub trait PageRecognizer: Send + Sync {
    /// Returns the text on page `page_number` (1-based).
    async fn recognize(&self, page_number: usize, page: &PageImage) -> Result<String, OcrError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    page_number: usize,
    image: &'a str,
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    text: String,
}

/// Calls a remote OCR service: `POST {pageNumber, image, mimeType}` → `{text}`.
pub struct HttpPageRecognizer {
    client: Client,
    url: String,
}

impl HttpPageRecognizer {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }
}

#[async_trait]
impl PageRecognizer for HttpPageRecognizer {
    async fn recognize(&self, page_number: usize, page: &PageImage) -> Result<String, OcrError> {
        let response = self
            .client
            .post(&self.url)
            .json(&RecognizeRequest {
                page_number,
                image: &page.image,
                mime_type: &page.mime_type,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::Rejected {
                page: page_number,
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<RecognizeResponse>().await?.text)
    }
}

/// Text recognised across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutcome {
    pub text: String,
    pub pages_processed: usize,
}

pub struct ProgressiveOcr {
    recognizer: Arc<dyn PageRecognizer>,
    page_delay: Duration,
}

impl ProgressiveOcr {
    pub fn new(recognizer: Arc<dyn PageRecognizer>, page_delay: Duration) -> Self {
        Self {
            recognizer,
            page_delay,
        }
    }

    /// Recognises `pages` in order. `on_page(done, total)` fires after each page.
    /// The first failing page aborts the run.
    pub async fn run<F>(&self, pages: &[PageImage], mut on_page: F) -> Result<OcrOutcome, OcrError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = pages.len();
        let mut sections = Vec::with_capacity(total);

        for (i, page) in pages.iter().enumerate() {
            if i > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            let page_number = i + 1;
            let text = self.recognizer.recognize(page_number, page).await?;
            debug!("OCR page {page_number}/{total}: {} chars", text.len());
            sections.push(format!("--- Page {page_number} ---\n{}", text.trim()));
            on_page(page_number, total);
        }

        info!("OCR finished: {total} pages");
        Ok(OcrOutcome {
            text: sections.join("\n\n"),
            pages_processed: total,
        })
    }
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use super::*;

    /// Echoes "text of page N"; records the order pages were seen in.
    #[derive(Default)]
    pub struct EchoRecognizer {
        pub seen: Mutex<Vec<usize>>,
        pub fail_on: Option<usize>,
    }

    #[async_trait]
    impl PageRecognizer for EchoRecognizer {
        async fn recognize(&self, page_number: usize, _page: &PageImage) -> Result<String, OcrError> {
            if self.fail_on == Some(page_number) {
                return Err(OcrError::Rejected {
                    page: page_number,
                    status: 500,
                    message: "unreadable".to_string(),
                });
            }
            self.seen.lock().unwrap().push(page_number);
            Ok(format!("text of page {page_number}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::EchoRecognizer;
    use super::*;

    fn pages(n: usize) -> Vec<PageImage> {
        (0..n)
            .map(|_| PageImage {
                image: "aGk=".to_string(),
                mime_type: "image/png".to_string(),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_processed_in_order_with_delay() {
        let recognizer = Arc::new(EchoRecognizer::default());
        let ocr = ProgressiveOcr::new(recognizer.clone(), Duration::from_secs(1));
        let mut progress = Vec::new();

        let started = tokio::time::Instant::now();
        let outcome = ocr.run(&pages(3), |done, total| progress.push((done, total))).await.unwrap();

        assert_eq!(*recognizer.seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(outcome.pages_processed, 3);
        assert!(outcome.text.starts_with("--- Page 1 ---\ntext of page 1"));
        assert!(outcome.text.ends_with("text of page 3"));
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failing_page_aborts_run() {
        let recognizer = Arc::new(EchoRecognizer {
            fail_on: Some(2),
            ..Default::default()
        });
        let ocr = ProgressiveOcr::new(recognizer.clone(), Duration::ZERO);

        let err = ocr.run(&pages(4), |_, _| {}).await.unwrap_err();
        assert!(matches!(err, OcrError::Rejected { page: 2, .. }));
        assert_eq!(*recognizer.seen.lock().unwrap(), vec![1]);
    }
}
