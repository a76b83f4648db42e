//! Chunk extraction pipeline for sustainability reports.
//!
//! The request path feeds raw page text through [`normalize`], slices it into
//! fixed-size overlapping windows with [`splitter`], and persists the result
//! as a per-job artifact via [`store`]. [`service`] orchestrates the pieces
//! for the HTTP surface.

pub mod normalize;
pub mod service;
pub mod splitter;
pub mod store;
pub mod types;

pub use normalize::normalize_page_text;
pub use service::{AnalysisApi, AnalysisError, AnalysisService};
pub use splitter::{ChunkParams, split_page};
pub use store::ChunkStore;
pub use types::{AnalysisOutcome, Chunk, ChunkSet, ChunkingError, PdfInfo, StoreError};
