// src/config.rs
//! Pipeline configuration: env-loaded knobs with compiled-in defaults.
//!
//! The insecure-transport carve-out is deliberately double-gated: the env
//! flag must be set AND the process must run in a named dev environment.
//! The resulting bool is carried inside the config value handed to the
//! fetcher, never a process-wide toggle.

use std::time::Duration;

// --- env names ---
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_NOTICE_SOURCE_URL: &str = "NOTICE_SOURCE_URL";
pub const ENV_NOTICE_SOURCE_ALT_URL: &str = "NOTICE_SOURCE_ALT_URL";
pub const ENV_ALLOW_INSECURE_TRANSPORT: &str = "ALLOW_INSECURE_TRANSPORT";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_ANALYSIS_API_KEY: &str = "ANALYSIS_API_KEY";
pub const ENV_ANALYSIS_BASE_URL: &str = "ANALYSIS_BASE_URL";
pub const ENV_ANALYSIS_MODEL: &str = "ANALYSIS_MODEL";
pub const ENV_KNOWLEDGE_STORE_URL: &str = "KNOWLEDGE_STORE_URL";
pub const ENV_CATEGORY_RULES_PATH: &str = "CATEGORY_RULES_PATH";

// --- defaults ---
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 12;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 12;
/// Documents below this byte count are analyzed inline; at/above it the
/// asynchronous upload-and-poll job path is used.
pub const DEFAULT_INLINE_SIZE_LIMIT: usize = 20 * 1024 * 1024;
pub const DEFAULT_MAX_RECORDS: usize = 15;
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1500;
pub const DEFAULT_OVERLAP_TARGET_CHARS: usize = 200;
pub const DEFAULT_MIN_CHUNK_CHARS: usize = 100;
pub const DEFAULT_ANALYSIS_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_CATEGORY_RULES_PATH: &str = "config/categories.toml";

/// Identifying header sent on every outbound fetch.
pub const USER_AGENT: &str = "campus-notice-ingest/0.1 (+notice pipeline)";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub notice_source_url: String,
    pub notice_source_alt_url: Option<String>,
    pub fetch_timeout: Duration,
    pub allow_insecure_transport: bool,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
    pub inline_size_limit: usize,
    pub max_records: usize,
    pub max_chunk_chars: usize,
    pub overlap_target_chars: usize,
    pub min_chunk_chars: usize,
    pub analysis_api_key: String,
    pub analysis_base_url: String,
    pub analysis_model: String,
    pub knowledge_store_url: Option<String>,
    pub category_rules_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            notice_source_url: String::new(),
            notice_source_alt_url: None,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            allow_insecure_transport: false,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
            inline_size_limit: DEFAULT_INLINE_SIZE_LIMIT,
            max_records: DEFAULT_MAX_RECORDS,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            overlap_target_chars: DEFAULT_OVERLAP_TARGET_CHARS,
            min_chunk_chars: DEFAULT_MIN_CHUNK_CHARS,
            analysis_api_key: String::new(),
            analysis_base_url: DEFAULT_ANALYSIS_BASE_URL.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            knowledge_store_url: None,
            category_rules_path: DEFAULT_CATEGORY_RULES_PATH.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Build from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            notice_source_url: std::env::var(ENV_NOTICE_SOURCE_URL).unwrap_or_default(),
            notice_source_alt_url: std::env::var(ENV_NOTICE_SOURCE_ALT_URL).ok(),
            fetch_timeout: Duration::from_secs(parse_env_u64(
                ENV_FETCH_TIMEOUT_SECS,
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            allow_insecure_transport: insecure_transport_enabled(),
            analysis_api_key: std::env::var(ENV_ANALYSIS_API_KEY).unwrap_or_default(),
            analysis_base_url: std::env::var(ENV_ANALYSIS_BASE_URL)
                .unwrap_or_else(|_| defaults.analysis_base_url.clone()),
            analysis_model: std::env::var(ENV_ANALYSIS_MODEL)
                .unwrap_or_else(|_| defaults.analysis_model.clone()),
            knowledge_store_url: std::env::var(ENV_KNOWLEDGE_STORE_URL).ok(),
            category_rules_path: std::env::var(ENV_CATEGORY_RULES_PATH)
                .unwrap_or_else(|_| defaults.category_rules_path.clone()),
            ..defaults
        }
    }
}

/// Named dev environment check (debug build or APP_ENV in {local, development, dev}).
pub fn dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var(ENV_APP_ENV)
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Relaxed certificate validation requires BOTH the explicit env flag and a
/// dev environment. Outside that context it silently stays off.
fn insecure_transport_enabled() -> bool {
    let flag = std::env::var(ENV_ALLOW_INSECURE_TRANSPORT).ok().as_deref() == Some("1");
    flag && dev_env()
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
