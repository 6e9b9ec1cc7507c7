// src/ingest.rs
//! Ingestion orchestrator: composes fetch/parse for scraped notices and
//! analysis/chunking for uploaded documents, applies the global fallback
//! behavior, and emits the uniform result envelope.
//!
//! Degradation is never silent: every envelope carries a `source` tag and,
//! when something went sideways on the way, a `note`.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{DocumentAnalyzer, DocumentUpload};
use crate::chunk::{chunk_text, Chunk, ChunkConfig};
use crate::error::PipelineError;
use crate::fetch::{fallback, ContentSource, FetchTarget};
use crate::parse::{Notice, NoticeParser};
use crate::store::{content_id, KnowledgeEntry, KnowledgeStore};

pub const SOURCE_LIVE_SCRAPE: &str = "live_scrape";
pub const SOURCE_FALLBACK_STATIC: &str = "fallback_static";
pub const SOURCE_LIVE_ANALYSIS: &str = "live_analysis";

/// Caller-facing envelope for the notices path. Field names follow the
/// established wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct NoticesEnvelope {
    pub success: bool,
    pub notices: Vec<Notice>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Caller-facing envelope for the document path.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentEnvelope {
    pub success: bool,
    pub chunks_data: Vec<Chunk>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub struct IngestionPipeline {
    source: Arc<dyn ContentSource>,
    parser: NoticeParser,
    analyzer: DocumentAnalyzer,
    store: Arc<dyn KnowledgeStore>,
    chunk_cfg: ChunkConfig,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        parser: NoticeParser,
        analyzer: DocumentAnalyzer,
        store: Arc<dyn KnowledgeStore>,
        chunk_cfg: ChunkConfig,
    ) -> Self {
        crate::metrics::ensure_pipeline_metrics_described();
        Self {
            source,
            parser,
            analyzer,
            store,
            chunk_cfg,
        }
    }

    /// Scraped-content path. Never fails the caller: acquisition or parse
    /// trouble substitutes the curated static dataset, tagged as such.
    pub async fn ingest_notices(&self, target: &FetchTarget) -> NoticesEnvelope {
        let request_id = Uuid::new_v4();

        match self.source.acquire(target).await {
            Ok(raw) => {
                let notices = self.parser.parse(&raw);
                if notices.is_empty() {
                    tracing::warn!(
                        %request_id,
                        target = %target.name,
                        error = %PipelineError::ParseDegraded,
                        "live source degraded, substituting static dataset"
                    );
                    counter!("ingest_fallback_total").increment(1);
                    return Self::fallback_envelope(fallback::FALLBACK_NOTE);
                }
                counter!("ingest_live_total").increment(1);
                tracing::info!(
                    %request_id,
                    target = %target.name,
                    count = notices.len(),
                    tier = raw.tier.as_str(),
                    "live notices ingested"
                );
                NoticesEnvelope {
                    success: true,
                    total_count: notices.len(),
                    notices,
                    last_updated: Utc::now().to_rfc3339(),
                    source: SOURCE_LIVE_SCRAPE.to_string(),
                    note: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    %request_id,
                    target = %target.name,
                    error = %e,
                    "acquisition failed, substituting static dataset"
                );
                counter!("ingest_fallback_total").increment(1);
                Self::fallback_envelope(e.advice())
            }
        }
    }

    fn fallback_envelope(note: &str) -> NoticesEnvelope {
        let notices = fallback::static_notices();
        NoticesEnvelope {
            success: true,
            total_count: notices.len(),
            notices,
            last_updated: Utc::now().to_rfc3339(),
            source: SOURCE_FALLBACK_STATIC.to_string(),
            note: Some(note.to_string()),
        }
    }

    /// Document path. Intrinsic input problems surface as `InvalidInput`;
    /// analysis outcomes (including timeouts) carry their own typed errors
    /// for the API layer to translate. Storage is fire-and-report.
    pub async fn ingest_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<DocumentEnvelope, PipelineError> {
        let request_id = Uuid::new_v4();

        if upload.file_name.trim().is_empty() {
            return Err(PipelineError::InvalidInput("missing file name".into()));
        }
        if upload.mime_type != "application/pdf" {
            return Err(PipelineError::InvalidInput(format!(
                "unsupported media type '{}', expected application/pdf",
                upload.mime_type
            )));
        }
        if upload.bytes.is_empty() {
            return Err(PipelineError::InvalidInput("empty file".into()));
        }

        let report = self.analyzer.analyze(&upload).await?;

        let text = report.extracted_text.trim();
        if text.is_empty() {
            return Err(PipelineError::InvalidInput(
                "document produced no extractable text".into(),
            ));
        }

        let chunks = chunk_text(text, &self.chunk_cfg);
        counter!("ingest_chunks_total").increment(chunks.len() as u64);
        tracing::info!(
            %request_id,
            file = %upload.file_name,
            chunks = chunks.len(),
            "document analyzed and chunked"
        );

        let title = if report.title.trim().is_empty() {
            upload.file_name.clone()
        } else {
            report.title.clone()
        };
        let mut tags: Vec<String> = report
            .topics
            .iter()
            .chain(report.key_phrases.iter())
            .take(10)
            .cloned()
            .collect();
        tags.dedup();

        let mut stored = 0usize;
        let mut store_errors = 0usize;
        for chunk in &chunks {
            let entry = KnowledgeEntry {
                id: content_id(&title, &chunk.text),
                title: title.clone(),
                content: chunk.text.clone(),
                category: if report.category.is_empty() {
                    "General".to_string()
                } else {
                    report.category.clone()
                },
                tags: tags.clone(),
                source: "pdf_upload".to_string(),
                metadata: serde_json::json!({
                    "requestId": request_id.to_string(),
                    "fileName": upload.file_name.clone(),
                    "chunkIndex": chunk.index,
                    "totalChunks": chunks.len(),
                    "docType": report.doc_type.clone(),
                }),
            };
            match self.store.store(entry).await {
                Ok(receipt) if receipt.success => stored += 1,
                Ok(receipt) => {
                    store_errors += 1;
                    tracing::warn!(%request_id, error = ?receipt.error, "store rejected chunk");
                }
                Err(e) => {
                    store_errors += 1;
                    tracing::warn!(%request_id, error = ?e, "store call failed");
                }
            }
        }
        if store_errors > 0 {
            counter!("ingest_store_errors_total").increment(store_errors as u64);
        }

        let note = if chunks.is_empty() {
            Some("document produced no storable chunks".to_string())
        } else if store_errors > 0 {
            Some(format!("stored {stored} of {} chunks", chunks.len()))
        } else {
            None
        };

        Ok(DocumentEnvelope {
            success: true,
            total_count: chunks.len(),
            chunks_data: chunks,
            last_updated: Utc::now().to_rfc3339(),
            source: SOURCE_LIVE_ANALYSIS.to_string(),
            note,
        })
    }
}
