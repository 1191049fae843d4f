//! Object storage client and export publisher.
//!
//! This crate provides:
//! - An S3-compatible client (upload, presigned GET)
//! - The publisher: deterministic per-job keys and time-limited access URLs

pub mod client;
pub mod error;
pub mod publish;

pub use client::{S3Client, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use publish::{export_key, PublishedExport, Publisher, S3Publisher};
