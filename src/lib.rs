#![deny(missing_docs)]

//! Core library for the esgpipe sustainability-report analysis pipeline.

/// HTTP routing and the `/analyze` handler.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and the Gemini adapter.
pub mod embedding;
/// Embedding-ingestion run executed by the worker binary.
pub mod ingest;
/// Analysis job identity and request metadata.
pub mod job;
/// Structured logging and tracing setup.
pub mod logging;
/// Milvus/Zilliz vector collection integration.
pub mod milvus;
/// PDF text extraction wrapper.
pub mod pdf;
/// Chunk extraction pipeline: normalize, split, store.
pub mod processing;
/// Batch-prompt JSONL builder for material topics.
pub mod prompts;
