//! In-memory job store for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reverie_models::{ExportJob, JobId, JobStatus};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// Job store backed by a process-local map.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<String, ExportJob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a record. This is the enqueue side, which in
    /// production belongs to an external component.
    pub async fn insert(&self, job: ExportJob) {
        self.jobs.write().await.insert(job.id.to_string(), job);
    }

    async fn update<F>(&self, id: &JobId, f: F) -> StoreResult<ExportJob>
    where
        F: FnOnce(ExportJob) -> StoreResult<ExportJob>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;
        let updated = f(job)?;
        jobs.insert(id.to_string(), updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get(&self, id: &JobId) -> StoreResult<ExportJob> {
        self.jobs
            .read()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(id.as_str()))
    }

    async fn next_queued(&self) -> StoreResult<Option<ExportJob>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|j| j.status == JobStatus::Queued)
            .min_by_key(|j| j.created_at)
            .cloned())
    }

    async fn mark_processing(&self, id: &JobId) -> StoreResult<ExportJob> {
        self.update(id, |job| Ok(job.start()?)).await
    }

    async fn mark_done(&self, id: &JobId, result_url: &str) -> StoreResult<ExportJob> {
        self.update(id, |job| Ok(job.complete(result_url)?)).await
    }

    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<ExportJob> {
        self.update(id, |job| Ok(job.fail(error)?)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_models::ExportPayload;

    fn job() -> ExportJob {
        ExportJob::new(
            "user-1",
            ExportPayload::new("https://a/sky.mp4", "https://a/ground.mp4"),
        )
    }

    #[tokio::test]
    async fn test_roundtrip_and_transitions() {
        let store = MemoryStore::new();
        let j = job();
        let id = j.id.clone();
        store.insert(j).await;

        let picked = store.next_queued().await.unwrap().unwrap();
        assert_eq!(picked.id, id);

        let processing = store.mark_processing(&id).await.unwrap();
        assert_eq!(processing.status, JobStatus::Processing);
        assert!(store.next_queued().await.unwrap().is_none());

        let done = store.mark_done(&id, "https://signed/x.mp4").await.unwrap();
        assert_eq!(done.status, JobStatus::Done);
        assert!(done.is_consistent());
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get(&JobId::from_string("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_rejected() {
        let store = MemoryStore::new();
        let j = job();
        let id = j.id.clone();
        store.insert(j).await;

        // Queued jobs cannot complete directly.
        let err = store.mark_done(&id, "https://x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));

        // The stored record is untouched by the rejected write.
        assert_eq!(store.get(&id).await.unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_next_queued_returns_oldest() {
        let store = MemoryStore::new();
        let first = job();
        let first_id = first.id.clone();
        store.insert(first).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.insert(job()).await;

        let picked = store.next_queued().await.unwrap().unwrap();
        assert_eq!(picked.id, first_id);
    }
}
