//! Embedding-ingestion run for one job.
//!
//! The run is a straight-line state machine: load the chunk artifact, derive
//! the vector dimension from the first embedding call, ensure the collection
//! exists, embed every remaining chunk sequentially in chunk order, then
//! insert and flush. Any failure aborts the run; there is no checkpointing,
//! and a rerun reprocesses all chunks of the job from scratch.

use crate::embedding::{EmbeddingClient, EmbeddingError};
use crate::milvus::{ChunkRow, MilvusError, MilvusService};
use crate::processing::{ChunkStore, StoreError};
use thiserror::Error;
use uuid::Uuid;

/// Errors emitted by the ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Chunk artifact could not be loaded (including the missing-artifact case).
    #[error("Failed to load chunks: {0}")]
    Store(#[from] StoreError),
    /// The artifact exists but contains no chunks to embed.
    #[error("chunk artifact for job '{job_id}' contains no chunks")]
    EmptyChunkSet {
        /// Job whose artifact was empty.
        job_id: String,
    },
    /// Embedding call failed; no vector could be produced for a chunk.
    #[error("Embedding service failed: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Collection schema/index setup or load failed.
    #[error("Collection creation failed: {0}")]
    CollectionCreation(#[source] MilvusError),
    /// Bulk insert or flush failed; the collection may hold zero or some of
    /// the batch.
    #[error("Insert failed: {0}")]
    Insert(#[source] MilvusError),
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Number of chunks embedded and inserted.
    pub chunks_embedded: usize,
    /// Vector dimension derived from the first embedding call.
    pub dimension: usize,
}

/// Drives one ingestion run end to end.
pub struct IngestRunner {
    store: ChunkStore,
    embedding_client: Box<dyn EmbeddingClient>,
    milvus: MilvusService,
}

impl IngestRunner {
    /// Build a runner from its collaborators.
    pub fn new(
        store: ChunkStore,
        embedding_client: Box<dyn EmbeddingClient>,
        milvus: MilvusService,
    ) -> Self {
        Self {
            store,
            embedding_client,
            milvus,
        }
    }

    /// Run the ingestion pipeline for one job.
    pub async fn run(&self, job_id: &str) -> Result<IngestOutcome, IngestError> {
        tracing::info!(job_id, "Starting embedding ingestion");

        let chunk_set = self.store.load(job_id)?;
        if chunk_set.chunks.is_empty() {
            return Err(IngestError::EmptyChunkSet {
                job_id: job_id.to_string(),
            });
        }
        tracing::info!(job_id, chunks = chunk_set.chunks.len(), "Chunk artifact loaded");

        // The collection dimension is whatever the model returns; the first
        // call of the run fixes it for every subsequent chunk.
        let first_vector = self.embedding_client.embed(&chunk_set.chunks[0].text).await?;
        let dimension = first_vector.len();
        tracing::info!(job_id, dimension, "Derived embedding dimension");

        self.milvus
            .ensure_collection(dimension)
            .await
            .map_err(IngestError::CollectionCreation)?;

        let mut rows = Vec::with_capacity(chunk_set.chunks.len());
        let mut vectors = vec![first_vector];
        for chunk in &chunk_set.chunks[1..] {
            vectors.push(self.embedding_client.embed(&chunk.text).await?);
        }
        for (chunk, embedding) in chunk_set.chunks.iter().zip(vectors) {
            rows.push(ChunkRow {
                id: Uuid::new_v4().to_string(),
                embedding,
                text: chunk.text.clone(),
                job_id: chunk.job_id.clone(),
                page: i64::from(chunk.page),
            });
        }

        let inserted = self
            .milvus
            .insert_rows(&rows)
            .await
            .map_err(IngestError::Insert)?;
        self.milvus.flush().await.map_err(IngestError::Insert)?;

        tracing::info!(
            job_id,
            collection = self.milvus.collection_name(),
            chunks = inserted,
            dimension,
            "Embedding ingestion completed"
        );
        Ok(IngestOutcome {
            chunks_embedded: inserted,
            dimension,
        })
    }
}
