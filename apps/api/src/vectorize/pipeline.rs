use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::vectorize::chunker::{chunk_text, ChunkConfig};
use crate::vectorize::sink::{BatchSink, ChunkBatch};
use crate::vectorize::VectorizeError;

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

/// Snapshot of a vectorization run, published after every batch.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub document_id: Uuid,
    pub status: JobStatus,
    pub processed_chunks: usize,
    pub total_chunks: usize,
    pub batches_sent: usize,
    /// 0–100, never above 100.
    pub percent: u8,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Progress {
    pub fn pending(document_id: Uuid, total_chunks: usize) -> Self {
        Self {
            document_id,
            status: JobStatus::Pending,
            processed_chunks: 0,
            total_chunks,
            batches_sent: 0,
            percent: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    fn record_batch(&mut self, chunk_count: usize) {
        self.processed_chunks += chunk_count;
        self.batches_sent += 1;
        self.percent = percent(self.processed_chunks, self.total_chunks);
    }

    fn finish(&mut self, status: JobStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Sequential batch submitter. One batch in flight at a time, with a fixed
/// pause between batches; no fan-out and no retry.
pub struct StreamingVectorizer {
    sink: Arc<dyn BatchSink>,
    chunking: ChunkConfig,
    batch_size: usize,
    batch_delay: Duration,
}

impl StreamingVectorizer {
    pub fn new(sink: Arc<dyn BatchSink>, batch_delay: Duration) -> Self {
        Self {
            sink,
            chunking: ChunkConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay,
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn chunking(&self) -> ChunkConfig {
        self.chunking
    }

    /// Chunks `text` and submits every batch to the sink.
    ///
    /// `cancel` is checked before each batch; a batch already being sent is
    /// allowed to finish. Every state change is published on `progress`.
    pub async fn run(
        &self,
        document_id: Uuid,
        text: &str,
        cancel: &AtomicBool,
        progress: &watch::Sender<Progress>,
    ) -> Result<Progress, VectorizeError> {
        let chunks = chunk_text(text, self.chunking);
        let batch_count = chunks.len().div_ceil(self.batch_size);

        let mut state = Progress::pending(document_id, chunks.len());
        state.status = JobStatus::Running;
        progress.send_replace(state.clone());

        info!(
            "Vectorizing document {document_id}: {} chunks in {batch_count} batches",
            chunks.len()
        );

        for (batch_index, batch) in chunks.chunks(self.batch_size).enumerate() {
            if batch_index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            if cancel.load(Ordering::SeqCst) {
                info!(
                    "Vectorization of {document_id} cancelled after {} batches",
                    state.batches_sent
                );
                state.finish(JobStatus::Cancelled, None);
                progress.send_replace(state.clone());
                return Ok(state);
            }

            let payload = ChunkBatch {
                document_id,
                batch_index,
                chunks: batch.to_vec(),
                is_final: batch_index + 1 == batch_count,
            };

            if let Err(e) = self.sink.submit(&payload).await {
                warn!("Vectorization of {document_id} failed at batch {batch_index}: {e}");
                state.finish(JobStatus::Failed, Some(e.to_string()));
                progress.send_replace(state);
                return Err(e);
            }

            state.record_batch(batch.len());
            progress.send_replace(state.clone());
        }

        state.finish(JobStatus::Completed, None);
        progress.send_replace(state.clone());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::sink::recording::RecordingSink;

    fn text(len: usize) -> String {
        "x".repeat(len)
    }

    fn channel(id: Uuid) -> (watch::Sender<Progress>, watch::Receiver<Progress>) {
        watch::channel(Progress::pending(id, 0))
    }

    #[tokio::test]
    async fn test_batches_of_five_with_final_flag() {
        let sink = Arc::new(RecordingSink::default());
        let vectorizer = StreamingVectorizer::new(sink.clone(), Duration::ZERO);
        let id = Uuid::new_v4();
        let (tx, rx) = channel(id);

        // 10_000 chars → 13 chunks → batches of 5, 5, 3.
        let result = vectorizer
            .run(id, &text(10_000), &AtomicBool::new(false), &tx)
            .await
            .unwrap();

        let batches = sink.received();
        let sizes: Vec<_> = batches.iter().map(|b| b.chunks.len()).collect();
        assert_eq!(sizes, vec![5, 5, 3]);
        assert_eq!(
            batches.iter().map(|b| b.is_final).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(result.status, JobStatus::Completed);
        assert_eq!(result.percent, 100);
        assert_eq!(*rx.borrow(), result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_batches_not_before_first() {
        let sink = Arc::new(RecordingSink::default());
        let vectorizer = StreamingVectorizer::new(sink.clone(), Duration::from_secs(3));
        let id = Uuid::new_v4();
        let (tx, _rx) = channel(id);

        let started = tokio::time::Instant::now();
        vectorizer
            .run(id, &text(10_000), &AtomicBool::new(false), &tx)
            .await
            .unwrap();

        // Three batches → two pauses.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_batch() {
        let sink = Arc::new(RecordingSink::default());
        let vectorizer = StreamingVectorizer::new(sink.clone(), Duration::ZERO);
        let id = Uuid::new_v4();
        let (tx, _rx) = channel(id);

        let result = vectorizer
            .run(id, &text(10_000), &AtomicBool::new(true), &tx)
            .await
            .unwrap();

        assert_eq!(result.status, JobStatus::Cancelled);
        assert!(sink.received().is_empty());
        assert_eq!(result.processed_chunks, 0);
    }

    #[tokio::test]
    async fn test_sink_failure_stops_run_and_reports_failed() {
        let sink = Arc::new(RecordingSink::failing_from(1));
        let vectorizer = StreamingVectorizer::new(sink.clone(), Duration::ZERO);
        let id = Uuid::new_v4();
        let (tx, rx) = channel(id);

        let err = vectorizer
            .run(id, &text(10_000), &AtomicBool::new(false), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, VectorizeError::Rejected { batch_index: 1, .. }));
        assert_eq!(sink.received().len(), 1);
        let last = rx.borrow().clone();
        assert_eq!(last.status, JobStatus::Failed);
        assert_eq!(last.processed_chunks, 5);
        assert_eq!(last.percent, 38);
    }

    #[test]
    fn test_percent_never_exceeds_100() {
        assert_eq!(percent(20, 13), 100);
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(1, 3), 33);
    }
}
