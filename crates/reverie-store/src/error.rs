//! Store error types.

use reverie_models::TransitionError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the job record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(String),

    #[error("store rejected transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("store request failed: {0}")]
    RequestFailed(String),

    #[error("store returned status {status}: {message}")]
    BadStatus { status: u16, message: String },

    #[error("failed to configure store client: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
