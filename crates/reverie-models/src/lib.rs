//! Shared data models for the Reverie export backend.
//!
//! This crate provides:
//! - The export job record and its status state machine
//! - The composition payload submitted by the client
//! - Asset roles used by the media pipeline

pub mod job;
pub mod payload;

pub use job::{ExportJob, JobId, JobStatus, TransitionError};
pub use payload::{AssetRole, ExportPayload};
