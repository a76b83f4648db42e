//! Shared types used by the Milvus client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum MilvusError {
    /// Base URI failed to parse or normalize.
    #[error("Invalid Milvus URI: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint responded with an unexpected HTTP status.
    #[error("Unexpected Milvus response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The endpoint answered 200 but reported a logical failure.
    #[error("Milvus error {code}: {message}")]
    Server {
        /// Milvus status code.
        code: i64,
        /// Server-provided diagnostic.
        message: String,
    },
    /// The server acknowledged fewer rows than were submitted.
    ///
    /// Insert is best-effort at the store; the collection may hold zero or
    /// some of the submitted rows after this error.
    #[error("Insert acknowledged {inserted} of {submitted} rows")]
    InsertCountMismatch {
        /// Rows submitted in the request.
        submitted: usize,
        /// Rows the server reports as inserted.
        inserted: usize,
    },
}

/// One row of the chunk collection.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkRow {
    /// Opaque primary id, freshly generated per insert.
    pub id: String,
    /// Embedding vector; length must match the collection dimension.
    pub embedding: Vec<f32>,
    /// Chunk text payload.
    pub text: String,
    /// Owning job identifier.
    pub job_id: String,
    /// 1-based page number of the source chunk.
    pub page: i64,
}

/// Response envelope shared by all `/v2/vectordb` endpoints. HTTP 200 with a
/// non-zero `code` signals a logical failure.
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ResponseEnvelope<T> {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) data: Option<T>,
}

#[derive(Deserialize)]
pub(crate) struct HasCollectionData {
    #[serde(default)]
    pub(crate) has: bool,
}

#[derive(Deserialize)]
pub(crate) struct InsertData {
    #[serde(rename = "insertCount", default)]
    pub(crate) insert_count: usize,
}
