// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analysis;
pub mod api;
pub mod chunk;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod metrics;
pub mod parse;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::chunk::{chunk_text, Chunk, ChunkConfig};
pub use crate::error::PipelineError;
pub use crate::ingest::{DocumentEnvelope, IngestionPipeline, NoticesEnvelope};
