// src/analysis/backend.rs
//! Remote multimodal analysis capability.
//!
//! The lifecycle logic in `job.rs` only sees this trait; the production
//! implementation speaks the Gemini-style HTTP surface (inline generation,
//! file upload, status, generation against an uploaded reference, delete).

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::USER_AGENT;

/// Handle to an uploaded remote artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFileState {
    Processing,
    Active,
    Failed,
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn upload(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<RemoteFile>;
    async fn file_state(&self, file: &RemoteFile) -> Result<RemoteFileState>;
    async fn generate_with_file(&self, file: &RemoteFile, prompt: &str) -> Result<String>;
    async fn generate_inline(&self, mime_type: &str, bytes: &[u8], prompt: &str)
        -> Result<String>;
    async fn delete_file(&self, file: &RemoteFile) -> Result<()>;
    fn name(&self) -> &'static str;
}

pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(90))
            .build()
            .context("analysis http client")?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        #[derive(Serialize)]
        struct Req {
            contents: Vec<Content>,
        }
        #[derive(Serialize)]
        struct Content {
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: RespContent,
        }
        #[derive(Deserialize)]
        struct RespContent {
            #[serde(default)]
            parts: Vec<RespPart>,
        }
        #[derive(Deserialize)]
        struct RespPart {
            #[serde(default)]
            text: Option<String>,
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let resp = self
            .http
            .post(&url)
            .json(&Req {
                contents: vec![Content { parts }],
            })
            .send()
            .await
            .context("generateContent request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "generateContent returned {status}: {}",
                body.chars().take(300).collect::<String>()
            ));
        }

        let body: Resp = resp.json().await.context("generateContent body")?;
        let text = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(anyhow!("generateContent returned no text candidates"));
        }
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Part {
    Text(String),
    InlineData { mime_type: String, data: String },
    FileData { mime_type: String, file_uri: String },
}

#[async_trait]
impl AnalysisBackend for GeminiBackend {
    async fn upload(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<RemoteFile> {
        #[derive(Deserialize)]
        struct Resp {
            file: FileMeta,
        }
        #[derive(Deserialize)]
        struct FileMeta {
            name: String,
            uri: String,
        }

        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let resp = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-File-Name", file_name)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes.to_vec())
            .send()
            .await
            .context("file upload request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "file upload returned {status}: {}",
                body.chars().take(300).collect::<String>()
            ));
        }

        let body: Resp = resp.json().await.context("file upload body")?;
        Ok(RemoteFile {
            name: body.file.name,
            uri: body.file.uri,
        })
    }

    async fn file_state(&self, file: &RemoteFile) -> Result<RemoteFileState> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            state: String,
        }

        let url = format!("{}/v1beta/{}?key={}", self.base_url, file.name, self.api_key);
        let body: Resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("file status request")?
            .error_for_status()
            .context("file status")?
            .json()
            .await
            .context("file status body")?;

        Ok(match body.state.as_str() {
            "ACTIVE" => RemoteFileState::Active,
            "FAILED" => RemoteFileState::Failed,
            _ => RemoteFileState::Processing,
        })
    }

    async fn generate_with_file(&self, file: &RemoteFile, prompt: &str) -> Result<String> {
        self.generate(vec![
            Part::FileData {
                mime_type: "application/pdf".to_string(),
                file_uri: file.uri.clone(),
            },
            Part::Text(prompt.to_string()),
        ])
        .await
    }

    async fn generate_inline(
        &self,
        mime_type: &str,
        bytes: &[u8],
        prompt: &str,
    ) -> Result<String> {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.generate(vec![
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data,
            },
            Part::Text(prompt.to_string()),
        ])
        .await
    }

    async fn delete_file(&self, file: &RemoteFile) -> Result<()> {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, file.name, self.api_key);
        self.http
            .delete(&url)
            .send()
            .await
            .context("file delete request")?
            .error_for_status()
            .context("file delete")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
