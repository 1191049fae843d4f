//! Asset acquisition and FFmpeg invocation for export jobs.
//!
//! This crate provides:
//! - Validated asset download with a size gate ahead of any transfer
//! - Job-scoped workspace directories with guaranteed cleanup
//! - Pure filter-graph/argument construction for the composition
//! - Encoder invocation with a hard wall-clock timeout

pub mod encoder;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod workspace;

pub use encoder::Encoder;
pub use error::{MediaError, MediaResult};
pub use fetch::fetch;
pub use graph::{build_encode_args, EncodeArgs, LayerPaths};
pub use workspace::JobWorkspace;
