// src/error.rs
//! Typed failure taxonomy for the ingestion pipeline.
//!
//! Only `InvalidInput` is surfaced to callers as a hard failure; every other
//! variant is caught by the orchestrator and degraded (fallback dataset or
//! degraded analysis report).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every transport tier in the fetch cascade failed.
    #[error("all {attempts} transport attempts exhausted for '{target}'")]
    FetchUnavailable { target: String, attempts: u32 },

    /// The batch parsed, but zero records survived validation.
    #[error("no valid records extracted from source")]
    ParseDegraded,

    /// The remote analysis capability reported a failure.
    #[error("remote analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    /// Polling budget exhausted while the remote job was still processing.
    /// Distinct from `AnalysisFailed` so callers can advise a retry.
    #[error("analysis polling budget exhausted after {attempts} attempts ({elapsed_secs}s)")]
    AnalysisTimedOut { attempts: u32, elapsed_secs: u64 },

    /// Missing/wrong-type payload or empty extracted text. The only class
    /// returned to the caller as an explicit failure.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// True for errors the caller caused and must fix themselves.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Short operator-facing hint attached to error envelopes.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::FetchUnavailable { .. } => "source unreachable, serving fallback data",
            Self::ParseDegraded => "source returned no usable records",
            Self::AnalysisFailed { .. } => "the document could not be analyzed; it may be unsupported",
            Self::AnalysisTimedOut { .. } => "analysis took too long; try again in a few minutes",
            Self::InvalidInput(_) => "check the uploaded file and media type",
        }
    }
}
