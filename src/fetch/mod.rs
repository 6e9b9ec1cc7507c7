// src/fetch/mod.rs
//! Content acquisition: a prioritized cascade of transports.
//!
//! Order: HTTPS with strict certificate validation, then a
//! relaxed-validation variant (only when explicitly configured, see
//! `config`), then plain HTTP on the target's alternate URL. The cascade
//! stops at the first success; exhausting it yields a typed
//! `FetchUnavailable`, never a raw transport error.

pub mod fallback;

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use crate::config::USER_AGENT;
use crate::error::PipelineError;

/// Declared media kind of an acquired source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Html,
    Xml,
    Pdf,
}

/// Raw fetched content. Immutable once produced; discarded after parsing.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub kind: MediaKind,
    pub text: String,
    pub size: usize,
    pub tier: TransportTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportTier {
    StrictTls,
    RelaxedTls,
    PlainHttp,
}

impl TransportTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrictTls => "strict_tls",
            Self::RelaxedTls => "relaxed_tls",
            Self::PlainHttp => "plain_http",
        }
    }
}

/// A named remote source, optionally with a plain-HTTP alternate URL for
/// the last cascade tier.
#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub name: String,
    pub url: String,
    pub alternate_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Builds the relaxed-validation client. Config only sets this in a
    /// named dev environment; it is per-instance, not process-wide.
    pub allow_insecure_transport: bool,
}

/// Seam for the orchestrator and tests; `SourceFetcher` is the production
/// implementation.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn acquire(&self, target: &FetchTarget) -> Result<RawSource, PipelineError>;
    fn name(&self) -> &'static str;
}

pub struct SourceFetcher {
    strict: reqwest::Client,
    relaxed: Option<reqwest::Client>,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(cfg: &FetchConfig) -> anyhow::Result<Self> {
        let strict = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.timeout)
            .build()?;

        let relaxed = if cfg.allow_insecure_transport {
            tracing::warn!("relaxed-validation transport tier enabled");
            Some(
                reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .connect_timeout(Duration::from_secs(4))
                    .timeout(cfg.timeout)
                    .danger_accept_invalid_certs(true)
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self {
            strict,
            relaxed,
            timeout: cfg.timeout,
        })
    }

    pub async fn fetch(&self, target: &FetchTarget) -> Result<RawSource, PipelineError> {
        let mut plan: Vec<(TransportTier, &reqwest::Client, &str)> =
            vec![(TransportTier::StrictTls, &self.strict, target.url.as_str())];
        if let Some(relaxed) = &self.relaxed {
            plan.push((TransportTier::RelaxedTls, relaxed, target.url.as_str()));
        }
        if let Some(alt) = &target.alternate_url {
            plan.push((TransportTier::PlainHttp, &self.strict, alt.as_str()));
        }

        let mut attempts = 0u32;
        for (tier, client, url) in plan {
            attempts += 1;
            counter!("fetch_attempts_total").increment(1);
            let t0 = std::time::Instant::now();

            match self.try_once(client, url).await {
                Ok(text) => {
                    let kind = sniff_kind(&text);
                    tracing::info!(
                        target = %target.name,
                        tier = tier.as_str(),
                        bytes = text.len(),
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        "fetch succeeded"
                    );
                    return Ok(RawSource {
                        kind,
                        size: text.len(),
                        text,
                        tier,
                    });
                }
                Err(e) => {
                    counter!("fetch_failures_total").increment(1);
                    tracing::warn!(
                        target = %target.name,
                        tier = tier.as_str(),
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        error = ?e,
                        "fetch attempt failed"
                    );
                }
            }
        }

        Err(PipelineError::FetchUnavailable {
            target: target.name.clone(),
            attempts,
        })
    }

    async fn try_once(&self, client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
        let resp = client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl ContentSource for SourceFetcher {
    async fn acquire(&self, target: &FetchTarget) -> Result<RawSource, PipelineError> {
        self.fetch(target).await
    }

    fn name(&self) -> &'static str {
        "http_cascade"
    }
}

fn sniff_kind(text: &str) -> MediaKind {
    let head = text.trim_start();
    if head.starts_with("<?xml") || head.starts_with("<rss") || text.contains("<rss ") {
        MediaKind::Xml
    } else {
        MediaKind::Html
    }
}
