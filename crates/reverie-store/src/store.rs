//! The job store trait.

use async_trait::async_trait;

use reverie_models::{ExportJob, JobId};

use crate::error::StoreResult;

/// Durable job-record store.
///
/// Status transitions go through the typed methods so the record's state
/// machine is enforced at the persistence boundary. Records are addressed
/// by job-scoped keys only; concurrent jobs never contend for the same
/// record.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a job record by ID.
    async fn get(&self, id: &JobId) -> StoreResult<ExportJob>;

    /// Return the oldest queued job, if any, without claiming it.
    async fn next_queued(&self) -> StoreResult<Option<ExportJob>>;

    /// Persist the `queued/failed -> processing` transition, stamping the
    /// processing-start time before any work begins.
    async fn mark_processing(&self, id: &JobId) -> StoreResult<ExportJob>;

    /// Persist `processing -> done` with the access URL and completion
    /// timestamp in one write.
    async fn mark_done(&self, id: &JobId, result_url: &str) -> StoreResult<ExportJob>;

    /// Persist `processing -> failed` with a short diagnostic and the
    /// completion timestamp in one write.
    async fn mark_failed(&self, id: &JobId, error: &str) -> StoreResult<ExportJob>;
}
