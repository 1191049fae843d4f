//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during asset acquisition and encoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("encoder '{0}' not found in PATH")]
    EncoderNotFound(String),

    #[error("asset not found at {url} (status: {status})")]
    NotFound { url: String, status: String },

    #[error("asset at {url} exceeds max size of {max_bytes} bytes (declared: {declared_bytes})")]
    TooLarge {
        url: String,
        declared_bytes: u64,
        max_bytes: u64,
    },

    #[error("asset transfer from {url} failed: {message}")]
    TransferFailed { url: String, message: String },

    #[error("encoder timed out after {0} seconds")]
    Timeout(u64),

    #[error("encoder exited with {}: {stderr_tail}", exit_code.map(|c| format!("code {c}")).unwrap_or_else(|| "signal".to_string()))]
    EncodeFailed {
        exit_code: Option<i32>,
        stderr_tail: String,
    },

    #[error("encoder reported success but produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an asset-not-found error.
    pub fn not_found(url: impl Into<String>, status: impl Into<String>) -> Self {
        Self::NotFound {
            url: url.into(),
            status: status.into(),
        }
    }

    /// Create a transfer failure error.
    pub fn transfer_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransferFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Check whether a fresh attempt could plausibly succeed.
    ///
    /// Size violations, missing assets and encode failures are permanent
    /// for a given payload; interrupted transfers are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MediaError::TransferFailed { .. } | MediaError::Io(_)
        )
    }
}
