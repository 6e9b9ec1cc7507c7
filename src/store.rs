// src/store.rs
//! Knowledge store handoff. The pipeline is the only writer; storage
//! failures are reported back in the result envelope, never escalated.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::USER_AGENT;

/// One storable knowledge unit.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub source: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreReceipt {
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn store(&self, entry: KnowledgeEntry) -> Result<StoreReceipt>;
    fn name(&self) -> &'static str;
}

/// Stable identity for a knowledge unit: content hash, not the parser's
/// per-pass sequence number.
pub fn content_id(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub struct HttpKnowledgeStore {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpKnowledgeStore {
    pub fn new(endpoint: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("knowledge store http client")?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl KnowledgeStore for HttpKnowledgeStore {
    async fn store(&self, entry: KnowledgeEntry) -> Result<StoreReceipt> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&entry)
            .send()
            .await
            .context("knowledge store request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(StoreReceipt {
                success: false,
                id: None,
                error: Some(format!(
                    "store returned {status}: {}",
                    body.chars().take(200).collect::<String>()
                )),
            });
        }
        resp.json().await.context("knowledge store receipt")
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Accepts everything and stores nothing. Used when no store endpoint is
/// configured.
pub struct NullStore;

#[async_trait]
impl KnowledgeStore for NullStore {
    async fn store(&self, entry: KnowledgeEntry) -> Result<StoreReceipt> {
        tracing::debug!(id = %entry.id, "no knowledge store configured, dropping entry");
        Ok(StoreReceipt {
            success: true,
            id: Some(entry.id),
            error: None,
        })
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_stable_and_input_sensitive() {
        let a = content_id("Exam schedule", "Midterms run in week 8.");
        let b = content_id("Exam schedule", "Midterms run in week 8.");
        let c = content_id("Exam schedule", "Midterms run in week 9.");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn null_store_acknowledges_with_the_given_id() {
        let receipt = NullStore
            .store(KnowledgeEntry {
                id: "abc123".into(),
                title: "t".into(),
                content: "c".into(),
                category: "General".into(),
                tags: vec![],
                source: "pdf_upload".into(),
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.id.as_deref(), Some("abc123"));
    }
}
