//! Fixed-size overlapping chunk splitter.
//!
//! Splitting works on characters, not bytes: the window and overlap counts
//! are char counts and every slice lands on a char boundary. Boundaries are
//! position-based only; no attempt is made to respect sentence or paragraph
//! structure.

use super::types::{Chunk, ChunkingError};

/// Window parameters for the splitter.
#[derive(Debug, Clone, Copy)]
pub struct ChunkParams {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Characters shared between consecutive chunks of a page.
    pub overlap: usize,
}

impl ChunkParams {
    /// Validate that the parameters allow the cursor to make progress.
    ///
    /// `overlap >= max_chars` would re-read the same span forever and
    /// `max_chars == 0` emits nothing, so both are rejected before the loop
    /// is entered.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.max_chars == 0 || self.overlap >= self.max_chars {
            return Err(ChunkingError::InvalidChunkParameters {
                max_chars: self.max_chars,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Split normalized page text into overlapping chunks.
///
/// The cursor starts at 0 and advances by `max_chars - overlap` per emitted
/// chunk; each chunk covers `[start, start + max_chars)` clipped to the text
/// length. Sequence numbers start at 1 and are scoped per page, making
/// chunk ids a deterministic function of `(job_id, page, seq)`.
///
/// Empty text yields no chunks; text no longer than `max_chars` yields
/// exactly one chunk spanning the whole text.
pub fn split_page(
    text: &str,
    job_id: &str,
    page: u32,
    params: &ChunkParams,
) -> Result<Vec<Chunk>, ChunkingError> {
    params.validate()?;

    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut seq = 1u32;

    loop {
        let end = (start + params.max_chars).min(char_len);
        let chunk_text = &text[bounds[start]..bounds[end]];
        chunks.push(Chunk {
            job_id: job_id.to_string(),
            chunk_id: format!("{job_id}-p{page}-c{seq}"),
            page,
            text: chunk_text.to_string(),
        });

        if start + params.max_chars >= char_len {
            break;
        }
        start += params.max_chars - params.overlap;
        seq += 1;
    }

    Ok(chunks)
}
