//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("media error: {0}")]
    Media(#[from] reverie_media::MediaError),

    #[error("publish error: {0}")]
    Storage(#[from] reverie_storage::StorageError),

    #[error("store error: {0}")]
    Store(#[from] reverie_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Check if a fresh attempt could plausibly succeed.
    ///
    /// Missing assets, oversize assets, encode failures and timeouts are
    /// deterministic for a given payload, so re-driving them only burns
    /// resources. Interrupted transfers and storage/store hiccups are
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Media(e) => e.is_transient(),
            WorkerError::Storage(_) | WorkerError::Store(_) | WorkerError::Io(_) => true,
            WorkerError::JobFailed(_) => false,
        }
    }
}
