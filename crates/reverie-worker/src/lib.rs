//! Media export worker.
//!
//! This crate provides:
//! - The job coordinator (fetch, compose, encode, publish, persist)
//! - A bounded retrier for transient failures
//! - A polling executor with graceful shutdown

pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod retry;

pub use config::WorkerConfig;
pub use coordinator::ExportCoordinator;
pub use error::{WorkerError, WorkerResult};
pub use executor::ExportExecutor;
pub use retry::{retry_async, RetryConfig, RetryResult};
