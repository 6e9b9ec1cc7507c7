// src/analysis/mod.rs
//! Remote document analysis: size-based strategy selection in front of the
//! inline and upload-and-poll paths, both converging on `AnalysisReport`.

pub mod backend;
pub mod job;
pub mod report;

use std::sync::Arc;

pub use backend::{AnalysisBackend, GeminiBackend, RemoteFile, RemoteFileState};
pub use job::{JobState, PollOutcome, PollPolicy, PollStep};
pub use report::AnalysisReport;

use crate::error::PipelineError;

/// Instruction sent alongside the document on both paths. Asks for the
/// structured payload `report.rs` knows how to extract.
pub const ANALYSIS_PROMPT: &str = "Analyze the attached document. Respond with a single JSON object \
with the fields: type, category, title, summary, topics (array), entities (array), \
keyPhrases (array), extractedText (the full plain text of the document), and \
keyInformation (object with any dates, amounts, deadlines, or contacts). \
Respond with the JSON object only.";

/// An uploaded binary document awaiting analysis.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub struct DocumentAnalyzer {
    backend: Arc<dyn AnalysisBackend>,
    policy: PollPolicy,
    inline_size_limit: usize,
}

impl DocumentAnalyzer {
    pub fn new(backend: Arc<dyn AnalysisBackend>, policy: PollPolicy, inline_size_limit: usize) -> Self {
        Self {
            backend,
            policy,
            inline_size_limit,
        }
    }

    /// Strategy selection happens here, before any remote call: small
    /// documents go inline in one synchronous request, large ones through
    /// the asynchronous job lifecycle. Both produce an `AnalysisReport`.
    pub async fn analyze(&self, upload: &DocumentUpload) -> Result<AnalysisReport, PipelineError> {
        let raw = if upload.bytes.len() < self.inline_size_limit {
            tracing::info!(
                file = %upload.file_name,
                bytes = upload.bytes.len(),
                "analyzing inline"
            );
            self.backend
                .generate_inline(&upload.mime_type, &upload.bytes, ANALYSIS_PROMPT)
                .await
                .map_err(|e| PipelineError::AnalysisFailed {
                    reason: format!("inline analysis: {e:#}"),
                })?
        } else {
            tracing::info!(
                file = %upload.file_name,
                bytes = upload.bytes.len(),
                limit = self.inline_size_limit,
                "document over inline limit, using job path"
            );
            job::run_document_job(self.backend.as_ref(), &self.policy, upload, ANALYSIS_PROMPT)
                .await?
        };

        Ok(AnalysisReport::from_response_text(&raw))
    }
}
