//! Notice & Document Ingestion Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use campus_notice_ingest::analysis::{DocumentAnalyzer, GeminiBackend, PollPolicy};
use campus_notice_ingest::api::{create_router, AppState};
use campus_notice_ingest::chunk::ChunkConfig;
use campus_notice_ingest::config::PipelineConfig;
use campus_notice_ingest::fetch::{FetchConfig, FetchTarget, SourceFetcher};
use campus_notice_ingest::ingest::IngestionPipeline;
use campus_notice_ingest::metrics::Metrics;
use campus_notice_ingest::parse::{CategoryRules, NoticeParser};
use campus_notice_ingest::store::{HttpKnowledgeStore, KnowledgeStore, NullStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campus_notice_ingest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PipelineConfig::from_env();
    let metrics = Metrics::init();

    let fetcher = SourceFetcher::new(&FetchConfig {
        timeout: cfg.fetch_timeout,
        allow_insecure_transport: cfg.allow_insecure_transport,
    })?;

    let rules = CategoryRules::load_or_default(&cfg.category_rules_path);
    let parser = NoticeParser::new(rules, cfg.max_records);

    let backend = GeminiBackend::new(
        cfg.analysis_api_key.clone(),
        cfg.analysis_base_url.clone(),
        cfg.analysis_model.clone(),
    )?;
    let analyzer = DocumentAnalyzer::new(
        Arc::new(backend),
        PollPolicy {
            interval: cfg.poll_interval,
            max_attempts: cfg.poll_max_attempts,
        },
        cfg.inline_size_limit,
    );

    let store: Arc<dyn KnowledgeStore> = match &cfg.knowledge_store_url {
        Some(url) => Arc::new(HttpKnowledgeStore::new(url.clone())?),
        None => Arc::new(NullStore),
    };

    let chunk_cfg = ChunkConfig {
        max_chars: cfg.max_chunk_chars,
        overlap_target_chars: cfg.overlap_target_chars,
        min_chars: cfg.min_chunk_chars,
    };

    let pipeline = IngestionPipeline::new(Arc::new(fetcher), parser, analyzer, store, chunk_cfg);

    let notice_target = FetchTarget {
        name: "notice_board".to_string(),
        url: cfg.notice_source_url.clone(),
        alternate_url: cfg.notice_source_alt_url.clone(),
    };

    let state = AppState {
        pipeline: Arc::new(pipeline),
        notice_target: Arc::new(notice_target),
    };
    let app = create_router(state).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "ingestion service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
