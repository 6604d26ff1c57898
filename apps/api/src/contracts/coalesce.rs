use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async lock per document id, so only one analysis per document runs at a time.
pub struct AnalysisLocks {
    inflight: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AnalysisLocks {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, document_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            // Entries only the map still references belong to finished analyses.
            inflight.retain(|id, lock| *id == document_id || Arc::strong_count(lock) > 1);
            Arc::clone(
                inflight
                    .entry(document_id)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }
}

impl Default for AnalysisLocks {
    fn default() -> Self {
        Self::new()
    }
}
