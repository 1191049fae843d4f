//! Export job record and status state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::payload::ExportPayload;

/// Unique identifier for an export job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Processing status of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting to be picked up.
    #[default]
    Queued,
    /// Job is being processed by a worker.
    Processing,
    /// Job completed and the result was published.
    Done,
    /// Job failed; terminal until externally re-queued.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invalid status transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// One request to compose input media assets into a single output video.
///
/// The record is owned by the coordinator while processing; `payload`,
/// `id` and `requester_id` are immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportJob {
    /// Unique job ID, assigned at enqueue time.
    pub id: JobId,

    /// Opaque identifier of the requesting user.
    pub requester_id: String,

    /// Composition inputs.
    pub payload: ExportPayload,

    /// Current status.
    #[serde(default)]
    pub status: JobStatus,

    /// Time-limited access URL; present only when `status == Done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    /// Short diagnostic; present only when `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Processing-start timestamp of the current attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completion timestamp (terminal state reached).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Create a new queued job.
    pub fn new(requester_id: impl Into<String>, payload: ExportPayload) -> Self {
        Self {
            id: JobId::new(),
            requester_id: requester_id.into(),
            payload,
            status: JobStatus::Queued,
            result_url: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Transition to `Processing`.
    ///
    /// Allowed from `Queued`, and from `Failed` when an external retrier
    /// re-drives the job as a fresh attempt (which clears the previous
    /// attempt's terminal fields).
    pub fn start(mut self) -> Result<Self, TransitionError> {
        match self.status {
            JobStatus::Queued | JobStatus::Failed => {
                self.status = JobStatus::Processing;
                self.started_at = Some(Utc::now());
                self.finished_at = None;
                self.error = None;
                Ok(self)
            }
            from => Err(TransitionError {
                from,
                to: JobStatus::Processing,
            }),
        }
    }

    /// Transition to `Done` with the published access URL.
    pub fn complete(mut self, result_url: impl Into<String>) -> Result<Self, TransitionError> {
        match self.status {
            JobStatus::Processing => {
                self.status = JobStatus::Done;
                self.result_url = Some(result_url.into());
                self.error = None;
                self.finished_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(TransitionError {
                from,
                to: JobStatus::Done,
            }),
        }
    }

    /// Transition to `Failed` with a short diagnostic.
    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, TransitionError> {
        match self.status {
            JobStatus::Processing => {
                self.status = JobStatus::Failed;
                self.error = Some(error.into());
                self.result_url = None;
                self.finished_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(TransitionError {
                from,
                to: JobStatus::Failed,
            }),
        }
    }

    /// Check the terminal-exclusivity invariant: exactly one of
    /// `result_url`/`error` is set in a terminal state, neither otherwise.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            JobStatus::Done => self.result_url.is_some() && self.error.is_none(),
            JobStatus::Failed => self.error.is_some() && self.result_url.is_none(),
            _ => self.result_url.is_none() && self.error.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ExportPayload {
        ExportPayload::new("https://a/sky.mp4", "https://a/ground.mp4")
    }

    #[test]
    fn test_job_creation() {
        let job = ExportJob::new("user123", payload());
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.started_at.is_none());
        assert!(job.is_consistent());
    }

    #[test]
    fn test_happy_path_transitions() {
        let job = ExportJob::new("user123", payload());

        let started = job.start().unwrap();
        assert_eq!(started.status, JobStatus::Processing);
        assert!(started.started_at.is_some());

        let done = started.complete("https://signed.example.com/out.mp4").unwrap();
        assert_eq!(done.status, JobStatus::Done);
        assert!(done.finished_at.is_some());
        assert!(done.is_consistent());
    }

    #[test]
    fn test_failure_transition_is_exclusive() {
        let job = ExportJob::new("user123", payload()).start().unwrap();
        let failed = job.fail("asset fetch failed").unwrap();

        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.result_url.is_none());
        assert!(failed.is_consistent());
    }

    #[test]
    fn test_terminal_states_reject_completion() {
        let done = ExportJob::new("u", payload())
            .start()
            .unwrap()
            .complete("https://x/y.mp4")
            .unwrap();
        assert!(done.clone().fail("nope").is_err());
        assert!(done.complete("https://x/z.mp4").is_err());
    }

    #[test]
    fn test_failed_job_can_be_redriven() {
        let failed = ExportJob::new("u", payload())
            .start()
            .unwrap()
            .fail("encode failed")
            .unwrap();

        let redriven = failed.start().unwrap();
        assert_eq!(redriven.status, JobStatus::Processing);
        assert!(redriven.error.is_none());
        assert!(redriven.finished_at.is_none());
        assert!(redriven.is_consistent());
    }

    #[test]
    fn test_queued_job_cannot_finish_directly() {
        let job = ExportJob::new("u", payload());
        assert!(job.clone().complete("https://x").is_err());
        assert!(job.fail("x").is_err());
    }
}
