//! Milvus/Zilliz vector collection integration.
//!
//! A thin REST client over the `/v2/vectordb` surface: idempotent
//! collection bootstrap (create-if-absent with a fixed schema and index),
//! bulk entity insert, and flush. Collection creation is check-then-create;
//! two first-time ingestion runs racing each other can both observe the
//! collection as absent, and the second create will fail server-side. No
//! distributed lock is attempted.

mod client;
mod types;

pub use client::MilvusService;
pub use types::{ChunkRow, MilvusError};
