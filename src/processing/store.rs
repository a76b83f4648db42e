//! Durable per-job chunk artifacts.
//!
//! One artifact per job at `<base>/<job_id>/chunks.json`, overwritten on
//! re-run. Writes go to a temporary file in the destination directory and
//! are published with a rename, so concurrent readers never observe a
//! partial artifact.

use super::types::{Chunk, ChunkSet, StoreError};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem store for chunk sets, keyed by job id.
pub struct ChunkStore {
    base_dir: PathBuf,
}

impl ChunkStore {
    /// Create a store rooted at `base_dir`. Directories are created lazily on
    /// the first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the artifact for `job_id`.
    pub fn artifact_path(&self, job_id: &str) -> PathBuf {
        self.base_dir.join(job_id).join("chunks.json")
    }

    /// Persist the full chunk set for a job, replacing any prior artifact.
    pub fn save(&self, job_id: &str, chunks: &[Chunk]) -> Result<PathBuf, StoreError> {
        let path = self.artifact_path(job_id);
        let dir = path
            .parent()
            .expect("artifact path always has a parent directory");
        fs::create_dir_all(dir)?;

        let payload = ChunkSet {
            job_id: job_id.to_string(),
            chunks: chunks.to_vec(),
        };
        let serialized = serde_json::to_vec_pretty(&payload)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &serialized)?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!(job_id, chunks = chunks.len(), path = %path.display(), "Chunk artifact written");
        Ok(path)
    }

    /// Load the chunk set for a job.
    pub fn load(&self, job_id: &str) -> Result<ChunkSet, StoreError> {
        let path = self.artifact_path(job_id);
        if !path.exists() {
            return Err(StoreError::ChunksNotFound {
                job_id: job_id.to_string(),
                path,
            });
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Base directory the store writes under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
