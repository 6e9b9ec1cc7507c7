// src/api.rs
//! HTTP boundary: routes, multipart intake, and error translation.
//!
//! Degraded pipeline outcomes still answer 200 with a tagged envelope;
//! only caller mistakes (`InvalidInput`) get a 4xx.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analysis::DocumentUpload;
use crate::error::PipelineError;
use crate::fetch::FetchTarget;
use crate::ingest::IngestionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    pub notice_target: Arc<FetchTarget>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/notices", get(get_notices))
        .route("/api/documents", post(upload_document))
        // Uploads can exceed the 20MB inline threshold; leave headroom.
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn get_notices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.ingest_notices(&state.notice_target).await)
}

#[derive(serde::Serialize)]
struct ApiError {
    success: bool,
    error: String,
    note: &'static str,
}

async fn upload_document(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<DocumentUpload> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                // Accept the conventional "file" field, or any part that
                // actually carries a filename.
                if field.name() != Some("file") && field.file_name().is_none() {
                    continue;
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some(DocumentUpload {
                            file_name,
                            mime_type,
                            bytes: bytes.to_vec(),
                        });
                        break;
                    }
                    Err(e) => {
                        return error_response(&PipelineError::InvalidInput(format!(
                            "unreadable upload: {e}"
                        )))
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(&PipelineError::InvalidInput(format!(
                    "malformed multipart body: {e}"
                )))
            }
        }
    }

    let Some(upload) = upload else {
        return error_response(&PipelineError::InvalidInput(
            "missing 'file' upload field".into(),
        ));
    };

    match state.pipeline.ingest_document(upload).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &PipelineError) -> Response {
    let status = if e.is_caller_fault() {
        StatusCode::BAD_REQUEST
    } else {
        // Analysis trouble is not the caller's fault; the envelope carries
        // the outcome while the transport stays healthy.
        StatusCode::OK
    };
    (
        status,
        Json(ApiError {
            success: false,
            error: e.to_string(),
            note: e.advice(),
        }),
    )
        .into_response()
}
