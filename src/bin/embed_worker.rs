//! Embedding-ingestion worker.
//!
//! Loads the chunk artifact of one job, embeds every chunk, and stores the
//! vectors in the configured collection. Invoked manually, one process per
//! job; any failure exits non-zero with a descriptive error.

use anyhow::{Context, Result};
use clap::Parser;
use esgpipe::{
    config::Config,
    embedding::GeminiEmbeddingClient,
    ingest::IngestRunner,
    logging,
    milvus::MilvusService,
    processing::ChunkStore,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "embed-worker",
    about = "Embed a job's stored chunks and insert them into the vector collection"
)]
struct Cli {
    /// Identifier of the job whose chunk artifact should be ingested.
    job_id: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env().context("failed to load configuration")?);
    logging::init_tracing();

    let cli = Cli::parse();

    let store = ChunkStore::new(config.chunks_dir.clone());
    let embedding_client =
        GeminiEmbeddingClient::new(&config).context("failed to build embedding client")?;
    let milvus = MilvusService::new(&config).context("failed to build Milvus client")?;

    let runner = IngestRunner::new(store, Box::new(embedding_client), milvus);
    let outcome = runner
        .run(&cli.job_id)
        .await
        .with_context(|| format!("embedding ingestion failed for job '{}'", cli.job_id))?;

    tracing::info!(
        job_id = %cli.job_id,
        chunks = outcome.chunks_embedded,
        dimension = outcome.dimension,
        "Worker finished"
    );
    Ok(())
}
