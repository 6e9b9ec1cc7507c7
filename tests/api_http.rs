// tests/api_http.rs
// Router-level behavior via tower::oneshot: envelope shapes and the
// InvalidInput-only hard failure rule.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use campus_notice_ingest::analysis::{
    AnalysisBackend, DocumentAnalyzer, PollPolicy, RemoteFile, RemoteFileState,
};
use campus_notice_ingest::api::{create_router, AppState};
use campus_notice_ingest::chunk::ChunkConfig;
use campus_notice_ingest::fetch::{ContentSource, FetchTarget, MediaKind, RawSource, TransportTier};
use campus_notice_ingest::ingest::IngestionPipeline;
use campus_notice_ingest::parse::{CategoryRules, NoticeParser};
use campus_notice_ingest::store::NullStore;
use campus_notice_ingest::PipelineError;

const BOARD_HTML: &str = include_str!("fixtures/notice_board.html");

/// A paragraph-shaped analysis answer long enough to clear the chunk floor.
const INLINE_RESPONSE: &str = "The academic regulations describe registration, withdrawal, \
and grading procedures for all enrolled students. Each procedure lists the responsible \
office and the deadline that applies during a regular semester.\n\nAppeals against grading \
decisions must be filed within two weeks of grade publication, and the committee answers \
within another two weeks at the latest.";

struct InlineBackend;

#[async_trait]
impl AnalysisBackend for InlineBackend {
    async fn upload(&self, _: &str, _: &str, _: &[u8]) -> Result<RemoteFile> {
        anyhow::bail!("inline-only test backend");
    }
    async fn file_state(&self, _: &RemoteFile) -> Result<RemoteFileState> {
        anyhow::bail!("inline-only test backend");
    }
    async fn generate_with_file(&self, _: &RemoteFile, _: &str) -> Result<String> {
        anyhow::bail!("inline-only test backend");
    }
    async fn generate_inline(&self, _: &str, _: &[u8], _: &str) -> Result<String> {
        Ok(INLINE_RESPONSE.to_string())
    }
    async fn delete_file(&self, _: &RemoteFile) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &'static str {
        "inline"
    }
}

struct FixtureSource;

#[async_trait]
impl ContentSource for FixtureSource {
    async fn acquire(&self, _t: &FetchTarget) -> std::result::Result<RawSource, PipelineError> {
        Ok(RawSource {
            kind: MediaKind::Html,
            text: BOARD_HTML.to_string(),
            size: BOARD_HTML.len(),
            tier: TransportTier::StrictTls,
        })
    }
    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn test_app() -> axum::Router {
    let pipeline = IngestionPipeline::new(
        Arc::new(FixtureSource),
        NoticeParser::new(CategoryRules::default(), 15),
        DocumentAnalyzer::new(
            Arc::new(InlineBackend),
            PollPolicy::default(),
            20 * 1024 * 1024,
        ),
        Arc::new(NullStore),
        ChunkConfig {
            max_chars: 1500,
            overlap_target_chars: 200,
            min_chars: 100,
        },
    );
    create_router(AppState {
        pipeline: Arc::new(pipeline),
        notice_target: Arc::new(FetchTarget {
            name: "board".into(),
            url: "https://campus.example.edu/board".into(),
            alternate_url: None,
        }),
    })
}

fn multipart_body(file_name: &str, content_type: &str, payload: &[u8]) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7e1a";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_answers_ok() {
    let resp = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn notices_envelope_has_the_wire_shape() {
    let resp = test_app()
        .oneshot(Request::get("/api/notices").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["source"], "live_scrape");
    assert_eq!(v["totalCount"], 5);
    assert!(v["lastUpdated"].is_string());
    assert_eq!(v["notices"][0]["id"], 1);
    assert!(v["notices"][0]["publishedAt"].is_string());
    assert!(v["notices"][0]["isRecent"].is_boolean());
}

#[tokio::test]
async fn pdf_upload_returns_chunked_envelope() {
    let (ct, body) = multipart_body("handbook.pdf", "application/pdf", b"%PDF-1.4 fake");
    let resp = test_app()
        .oneshot(
            Request::post("/api/documents")
                .header(header::CONTENT_TYPE, ct)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["source"], "live_analysis");
    assert!(v["totalCount"].as_u64().unwrap() >= 1);
    assert!(v["chunks_data"][0]["text"].is_string());
    assert_eq!(v["chunks_data"][0]["index"], 0);
}

#[tokio::test]
async fn wrong_media_type_is_a_hard_caller_failure() {
    let (ct, body) = multipart_body("notes.txt", "text/plain", b"just text");
    let resp = test_app()
        .oneshot(
            Request::post("/api/documents")
                .header(header::CONTENT_TYPE, ct)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v = json_body(resp).await;
    assert_eq!(v["success"], false);
    assert!(v["error"]
        .as_str()
        .unwrap()
        .contains("unsupported media type"));
}

#[tokio::test]
async fn missing_file_field_is_a_hard_caller_failure() {
    let boundary = "test-boundary-7e1a";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );
    let resp = test_app()
        .oneshot(
            Request::post("/api/documents")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v = json_body(resp).await;
    assert_eq!(v["success"], false);
}
