//! Job record store.
//!
//! The coordinator persists status transitions through the [`JobStore`]
//! trait. Two implementations are provided: an in-memory store for tests
//! and local runs, and a REST document-store client.

pub mod error;
pub mod memory;
pub mod rest;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::JobStore;
