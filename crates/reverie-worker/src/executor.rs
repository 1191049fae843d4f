//! Job executor.
//!
//! Polls the job store for queued work, runs jobs concurrently up to a
//! permit limit, and drains in-flight jobs on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use reverie_models::ExportJob;
use reverie_store::{JobStore, StoreError};

use crate::config::WorkerConfig;
use crate::coordinator::ExportCoordinator;
use crate::error::{WorkerError, WorkerResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Executor that pulls queued export jobs and drives them through the
/// coordinator.
pub struct ExportExecutor {
    config: WorkerConfig,
    store: Arc<dyn JobStore>,
    coordinator: Arc<ExportCoordinator>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl ExportExecutor {
    /// Create a new executor.
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn JobStore>,
        coordinator: Arc<ExportCoordinator>,
    ) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);

        Self {
            config,
            store,
            coordinator,
            job_semaphore,
            shutdown,
        }
    }

    /// Start the executor. Returns once shutdown has been signalled and
    /// in-flight jobs have drained (or the drain timeout elapsed).
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting export executor with {} max concurrent jobs",
            self.config.max_concurrent_jobs
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.dispatch_next().await {
                        error!("Error pulling queued jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "Drain timeout ({:?}) elapsed with jobs still in flight",
                self.config.shutdown_timeout
            );
        }

        info!("Export executor stopped");
        Ok(())
    }

    /// Claim the next queued job, if any, and spawn it onto a permit.
    ///
    /// The `processing` claim is persisted here, before the spawn, so a
    /// subsequent poll tick can never re-see a job that is already being
    /// dispatched.
    async fn dispatch_next(&self) -> WorkerResult<()> {
        if self.job_semaphore.available_permits() == 0 {
            return Ok(());
        }

        let Some(job) = self.store.next_queued().await? else {
            return Ok(());
        };

        let claimed = match self.store.mark_processing(&job.id).await {
            Ok(claimed) => claimed,
            // Another worker claimed the job between the read and the
            // write; leave it to them.
            Err(StoreError::InvalidTransition(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let permit = self
            .job_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;

        let coordinator = Arc::clone(&self.coordinator);
        let max_attempts = self.config.max_attempts;
        tokio::spawn(async move {
            let _permit = permit;
            Self::execute_job(coordinator, claimed, max_attempts).await;
        });

        Ok(())
    }

    /// Execute a single job with retries of transient failures.
    ///
    /// The first attempt runs against the record claimed in
    /// `dispatch_next`; a retry re-claims the job from its `failed` state.
    /// A non-retryable failure (or an exhausted budget) leaves the job in
    /// its persisted `failed` state; the coordinator already wrote the
    /// diagnostic, so here we only log the final outcome.
    async fn execute_job(coordinator: Arc<ExportCoordinator>, job: ExportJob, max_attempts: u32) {
        let retry_config = RetryConfig::new(format!("export job {}", job.id))
            .with_max_retries(max_attempts.saturating_sub(1));

        let first_attempt = std::sync::atomic::AtomicBool::new(true);
        let result = retry_async(&retry_config, WorkerError::is_retryable, || async {
            if first_attempt.swap(false, std::sync::atomic::Ordering::SeqCst) {
                coordinator.process_claimed(&job).await
            } else {
                coordinator.process(&job.id).await
            }
        })
        .await;

        match result {
            RetryResult::Success(()) => {
                info!(job_id = %job.id, "Job completed successfully");
            }
            RetryResult::Failed { error, attempts } => {
                error!(
                    job_id = %job.id,
                    attempts,
                    "Job failed permanently: {}",
                    error
                );
            }
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
