//! Job coordinator.
//!
//! Drives one queued export job through its state machine: persist
//! `processing`, fetch assets concurrently, build the composition, run
//! the encoder, publish the artifact, and write the terminal record. Any
//! error on the way is caught exactly once, persisted as `failed` with a
//! bounded diagnostic, and re-raised so the hosting retry mechanism can
//! decide whether to re-drive the job.

use std::sync::Arc;

use futures::future::try_join_all;
use metrics::counter;
use tracing::{error, info, warn};

use reverie_media::{
    build_encode_args, fetch, Encoder, JobWorkspace, LayerPaths, MediaError,
};
use reverie_models::{AssetRole, ExportJob, JobId};
use reverie_storage::{PublishedExport, Publisher};
use reverie_store::JobStore;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Cap on the diagnostic string persisted to the job record. Raw encoder
/// output is an internal detail and is never stored unbounded.
const MAX_ERROR_LEN: usize = 500;

/// Coordinates the export pipeline for individual jobs.
///
/// All collaborators are injected; the coordinator holds no ambient
/// global state and performs no internal retries.
pub struct ExportCoordinator {
    store: Arc<dyn JobStore>,
    publisher: Arc<dyn Publisher>,
    encoder: Encoder,
    http: reqwest::Client,
    config: WorkerConfig,
}

impl ExportCoordinator {
    /// Create a coordinator with the given collaborators.
    pub fn new(
        store: Arc<dyn JobStore>,
        publisher: Arc<dyn Publisher>,
        encoder: Encoder,
        config: WorkerConfig,
    ) -> WorkerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| WorkerError::job_failed(format!("http client: {e}")))?;

        Ok(Self {
            store,
            publisher,
            encoder,
            http,
            config,
        })
    }

    /// Claim one job and process it to a terminal state.
    ///
    /// The `processing` transition is persisted before any work begins, so
    /// a crash mid-job is observable as "stuck in processing" rather than
    /// silently lost. On failure the job record is marked `failed` and the
    /// error is re-raised for the caller's retry policy.
    pub async fn process(&self, id: &JobId) -> WorkerResult<()> {
        let job = self.store.mark_processing(id).await?;
        self.process_claimed(&job).await
    }

    /// Process a job whose `processing` transition is already persisted.
    ///
    /// Every error past this point, including a failed `done` write after
    /// a successful pipeline, ends in exactly one `mark_failed` attempt:
    /// the record never stays in `processing` over a fault this worker
    /// can observe.
    pub async fn process_claimed(&self, job: &ExportJob) -> WorkerResult<()> {
        let id = &job.id;
        info!(job_id = %id, requester_id = %job.requester_id, "Export job started");

        let err = match self.run_attempt(job).await {
            Ok(published) => match self.store.mark_done(id, &published.url).await {
                Ok(_) => {
                    counter!("reverie_jobs_completed_total").increment(1);
                    info!(job_id = %id, key = %published.key, "Export job done");
                    return Ok(());
                }
                Err(e) => e.into(),
            },
            Err(e) => e,
        };

        if matches!(err, WorkerError::Media(MediaError::Timeout(_))) {
            counter!("reverie_encode_timeouts_total").increment(1);
        }
        counter!("reverie_jobs_failed_total").increment(1);

        let excerpt = truncate_diagnostic(&err.to_string(), MAX_ERROR_LEN);
        // The failed write must happen even though we re-raise; a failure
        // to persist it is logged, not allowed to mask the original error.
        if let Err(persist_err) = self.store.mark_failed(id, &excerpt).await {
            error!(
                job_id = %id,
                "Failed to persist terminal failure: {}",
                persist_err
            );
        }
        error!(job_id = %id, "Export job failed: {}", excerpt);
        Err(err)
    }

    /// One processing attempt inside a fresh workspace.
    ///
    /// The workspace is removed on every return path; `Drop` covers the
    /// error paths and panics, the explicit close surfaces removal errors
    /// on the happy path.
    async fn run_attempt(&self, job: &ExportJob) -> WorkerResult<PublishedExport> {
        let workspace = JobWorkspace::create(&self.config.work_dir, &job.id)?;
        let result = self.run_in_workspace(job, &workspace).await;

        if let Err(e) = workspace.close() {
            warn!(job_id = %job.id, "Workspace cleanup failed: {}", e);
        }
        result
    }

    async fn run_in_workspace(
        &self,
        job: &ExportJob,
        workspace: &JobWorkspace,
    ) -> WorkerResult<PublishedExport> {
        let payload = &job.payload;

        // Fetches are independent I/O; issue them concurrently. The first
        // failure aborts the rest, and the job never reaches the encoder
        // with a missing required asset.
        let fetches = payload.assets().into_iter().map(|(role, url)| {
            let dest = workspace.asset_path(role);
            async move {
                fetch(&self.http, url, &dest, self.config.max_asset_bytes).await?;
                Ok::<_, WorkerError>(())
            }
        });
        try_join_all(fetches).await?;

        let mut layers = LayerPaths::new(
            workspace.asset_path(AssetRole::Sky),
            workspace.asset_path(AssetRole::Ground),
        );
        if payload.overlay_url.is_some() {
            layers = layers.with_overlay(workspace.asset_path(AssetRole::Overlay));
        }
        if payload.audio_url.is_some() {
            layers = layers.with_audio(workspace.asset_path(AssetRole::Audio));
        }

        let encode = build_encode_args(&layers, payload.duration_sec, &workspace.output_path());
        let output = self.encoder.run(&encode).await?;

        let published = self
            .publisher
            .publish(&output, &job.requester_id, &job.id)
            .await?;
        Ok(published)
    }
}

/// Bound a diagnostic message for persistence, truncating on a char
/// boundary and marking the cut.
fn truncate_diagnostic(message: &str, max_len: usize) -> String {
    if message.len() <= max_len {
        return message.to_string();
    }
    let cut = message
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_len.saturating_sub(16))
        .last()
        .unwrap_or(0);
    format!("{}... (truncated)", &message[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_diagnostics_pass_through() {
        assert_eq!(truncate_diagnostic("encode failed", 500), "encode failed");
    }

    #[test]
    fn test_long_diagnostics_are_bounded() {
        let long = "x".repeat(10_000);
        let bounded = truncate_diagnostic(&long, MAX_ERROR_LEN);
        assert!(bounded.len() <= MAX_ERROR_LEN);
        assert!(bounded.ends_with("... (truncated)"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(1_000);
        let bounded = truncate_diagnostic(&long, 100);
        assert!(bounded.len() <= 100);
    }
}
