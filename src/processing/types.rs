//! Core data types and error definitions for the chunk pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A bounded slice of page text with deterministic identity.
///
/// `chunk_id` encodes owner, page, and per-page sequence
/// (`<job_id>-p<page>-c<seq>`), so re-splitting identical input reproduces
/// identical records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the owning job.
    pub job_id: String,
    /// Deterministic chunk identifier, unique within the job.
    pub chunk_id: String,
    /// 1-based page number the text was extracted from.
    pub page: u32,
    /// Chunk text, at most `max_chars` characters.
    pub text: String,
}

/// Ordered chunk sequence for one job, as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSet {
    /// Identifier of the owning job.
    pub job_id: String,
    /// All chunks of the job, in page and sequence order.
    pub chunks: Vec<Chunk>,
}

/// Errors produced while splitting page text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// The splitter was configured with parameters that cannot make progress.
    #[error("invalid chunk parameters: max_chars={max_chars}, overlap={overlap} (require max_chars > 0 and overlap < max_chars)")]
    InvalidChunkParameters {
        /// Configured maximum characters per chunk.
        max_chars: usize,
        /// Configured overlap between consecutive chunks.
        overlap: usize,
    },
}

/// Errors raised by the chunk store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No chunk artifact exists for the requested job.
    #[error("chunks not found for job '{job_id}' at {path}")]
    ChunksNotFound {
        /// Job whose artifact was requested.
        job_id: String,
        /// Path that was probed.
        path: PathBuf,
    },
    /// Filesystem operation failed.
    #[error("chunk store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Artifact could not be serialized or deserialized.
    #[error("chunk artifact (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Lightweight PDF facts surfaced to the caller, never sent to any model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfInfo {
    /// Original filename of the upload.
    pub file_name: Option<String>,
    /// Number of pages, when the document parsed.
    pub num_pages: Option<usize>,
    /// Short excerpt of the first page for UI display.
    pub sample_excerpt: Option<String>,
}

/// Summary of one completed analysis request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// Number of chunks extracted and persisted (zero when extraction was
    /// skipped or failed best-effort).
    pub chunk_count: usize,
    /// Location of the chunk artifact, when one was written.
    pub chunks_file: Option<PathBuf>,
    /// Location of the batch prompt file.
    pub prompt_file: PathBuf,
    /// Lightweight PDF facts for the response payload.
    pub pdf_info: PdfInfo,
}
