use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::vectorize::chunker::estimate_chunk_count;
use crate::vectorize::pipeline::{Progress, StreamingVectorizer};
use crate::vectorize::VectorizeError;

struct JobEntry {
    progress: watch::Receiver<Progress>,
    cancel: Arc<AtomicBool>,
}

/// Background vectorization jobs, at most one active per document.
///
/// Finished jobs stay queryable until the next run for the same document
/// replaces them.
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns a job for `document_id`. Returns the expected chunk count.
    pub async fn start(
        &self,
        document_id: Uuid,
        text: String,
        vectorizer: StreamingVectorizer,
    ) -> Result<usize, VectorizeError> {
        let mut jobs = self.jobs.lock().await;
        if let Some(existing) = jobs.get(&document_id) {
            if existing.progress.borrow().status.is_active() {
                return Err(VectorizeError::AlreadyRunning(document_id));
            }
        }

        let expected = estimate_chunk_count(text.chars().count(), vectorizer.chunking());
        let (tx, rx) = watch::channel(Progress::pending(document_id, expected));
        let cancel = Arc::new(AtomicBool::new(false));
        jobs.insert(
            document_id,
            JobEntry {
                progress: rx,
                cancel: cancel.clone(),
            },
        );
        drop(jobs);

        tokio::spawn(async move {
            match vectorizer.run(document_id, &text, &cancel, &tx).await {
                Ok(done) => info!(
                    "Vectorization job for {document_id} ended: {:?} ({}/{} chunks)",
                    done.status, done.processed_chunks, done.total_chunks
                ),
                Err(e) => warn!("Vectorization job for {document_id} failed: {e}"),
            }
        });

        Ok(expected)
    }

    pub async fn progress(&self, document_id: Uuid) -> Option<Progress> {
        self.jobs
            .lock()
            .await
            .get(&document_id)
            .map(|job| job.progress.borrow().clone())
    }

    /// Requests cancellation. The batch in flight, if any, still completes.
    /// Returns false when no job is known for the document.
    pub async fn cancel(&self, document_id: Uuid) -> bool {
        match self.jobs.lock().await.get(&document_id) {
            Some(job) => {
                job.cancel.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::vectorize::pipeline::JobStatus;
    use crate::vectorize::sink::recording::RecordingSink;

    async fn wait_until_done(registry: &JobRegistry, id: Uuid) -> Progress {
        loop {
            let progress = registry.progress(id).await.unwrap();
            if !progress.status.is_active() {
                return progress;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_job_runs_to_completion() {
        let registry = JobRegistry::new();
        let sink = Arc::new(RecordingSink::default());
        let id = Uuid::new_v4();

        let expected = registry
            .start(id, "y".repeat(2500), StreamingVectorizer::new(sink.clone(), Duration::ZERO))
            .await
            .unwrap();
        let done = wait_until_done(&registry, id).await;

        assert_eq!(expected, 3);
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.processed_chunks, 3);
        assert_eq!(sink.received().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_rejected_while_running_and_cancel_stops_it() {
        let registry = JobRegistry::new();
        let sink = Arc::new(RecordingSink::default());
        let id = Uuid::new_v4();
        let slow = || StreamingVectorizer::new(sink.clone(), Duration::from_secs(3));

        registry.start(id, "z".repeat(10_000), slow()).await.unwrap();
        tokio::task::yield_now().await;

        let err = registry.start(id, "z".repeat(10), slow()).await.unwrap_err();
        assert!(matches!(err, VectorizeError::AlreadyRunning(_)));

        assert!(registry.cancel(id).await);
        let done = wait_until_done(&registry, id).await;
        assert_eq!(done.status, JobStatus::Cancelled);
        assert!(sink.received().len() < 3);
    }

    #[tokio::test]
    async fn test_unknown_job_has_no_progress_and_cannot_cancel() {
        let registry = JobRegistry::new();
        assert!(registry.progress(Uuid::new_v4()).await.is_none());
        assert!(!registry.cancel(Uuid::new_v4()).await);
    }
}
