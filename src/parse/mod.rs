// src/parse/mod.rs
//! Tolerant extraction of notice records from fetched board pages/feeds.
//!
//! Per-record extraction is isolated: a malformed record logs and is
//! skipped, never aborting the batch. Missing fields fall back to explicit
//! defaults instead of erroring.

pub mod feed;
pub mod html;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

use crate::fetch::{MediaKind, RawSource};

/// Titles shorter than this are treated as extraction noise and dropped.
pub const MIN_TITLE_CHARS: usize = 4;

/// Records published within this window count as recent.
const RECENT_WINDOW_DAYS: i64 = 7;

/// One normalized notice record.
///
/// `id` is assigned sequentially within a single parse pass and is not
/// stable across re-fetches; durable identity for downstream storage comes
/// from a content hash instead.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: u32,
    pub title: String,
    pub link: String,
    pub description: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
    pub is_recent: bool,
}

/// Field bundle produced by the format-specific extractors before
/// normalization and validation.
#[derive(Debug, Default, Clone)]
pub(crate) struct RawRecord {
    pub title: String,
    pub link: String,
    pub description: String,
    pub date_text: String,
    pub category_hint: Option<String>,
}

// ---------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------

/// Normalize scraped text: entity decode, tag strip, quote folding,
/// whitespace collapse, length cap.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }
    out
}

// ---------------------------------------------------------------
// Category inference
// ---------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryClass {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered keyword classes; the first class with a matching keyword wins,
/// so position in `classes` is the tie-break.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRules {
    pub classes: Vec<CategoryClass>,
    #[serde(default = "default_fallback_category")]
    pub fallback: String,
}

fn default_fallback_category() -> String {
    "General".to_string()
}

impl Default for CategoryRules {
    fn default() -> Self {
        let class = |name: &str, kws: &[&str]| CategoryClass {
            name: name.to_string(),
            keywords: kws.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            classes: vec![
                class(
                    "Scholarship",
                    &["scholarship", "grant", "tuition", "financial aid", "bursary"],
                ),
                class(
                    "Academic",
                    &["exam", "registration", "course", "semester", "curriculum", "grade", "enrol"],
                ),
                class(
                    "Employment",
                    &["recruit", "job", "career", "intern", "employment", "hiring"],
                ),
                class(
                    "Event",
                    &["seminar", "lecture", "festival", "workshop", "contest", "competition", "event"],
                ),
            ],
            fallback: default_fallback_category(),
        }
    }
}

impl CategoryRules {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from the configured TOML path, else compiled-in defaults.
    pub fn load_or_default(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, path, "bad category rules file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Best-effort keyword classification; not authoritative.
    pub fn infer(&self, text: &str) -> &str {
        let lower = text.to_lowercase();
        for class in &self.classes {
            if class.keywords.iter().any(|k| lower.contains(k.as_str())) {
                return &class.name;
            }
        }
        &self.fallback
    }
}

// ---------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------

/// Two-alternative date parsing: ISO-8601 first, RFC 2822 second, epoch
/// zero when neither matches.
pub(crate) fn parse_published_at(raw: &str) -> DateTime<Utc> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Utc.from_utc_datetime(&dt);
        }
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        if let Some(dt) = DateTime::from_timestamp(odt.unix_timestamp(), 0) {
            return dt;
        }
    }
    DateTime::from_timestamp(0, 0).unwrap_or_default()
}

// ---------------------------------------------------------------
// Parser
// ---------------------------------------------------------------

pub struct NoticeParser {
    rules: CategoryRules,
    max_records: usize,
}

impl NoticeParser {
    pub fn new(rules: CategoryRules, max_records: usize) -> Self {
        Self { rules, max_records }
    }

    /// Extract, normalize, validate, sort (most-recent-first) and cap.
    /// Never fails at the batch level; zero output means the source was
    /// degraded, not that the parser errored.
    pub fn parse(&self, raw: &RawSource) -> Vec<Notice> {
        let t0 = std::time::Instant::now();

        let records = match raw.kind {
            MediaKind::Html => html::extract_records(&raw.text),
            MediaKind::Xml => feed::extract_records(&raw.text).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, "feed parse failed");
                Vec::new()
            }),
            MediaKind::Pdf => {
                tracing::warn!("parser got a pdf source; documents go through analysis");
                Vec::new()
            }
        };
        counter!("parse_records_total").increment(records.len() as u64);

        let now = Utc::now();
        let mut out = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for rec in records {
            let title = normalize_text(&rec.title);
            if title.chars().count() < MIN_TITLE_CHARS {
                dropped += 1;
                tracing::debug!(raw_title = %rec.title, "dropping record with unusable title");
                continue;
            }

            let description = normalize_text(&rec.description);
            let category = rec
                .category_hint
                .as_deref()
                .map(normalize_text)
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| {
                    self.rules
                        .infer(&format!("{title} {description}"))
                        .to_string()
                });

            let published_at = parse_published_at(&rec.date_text);
            let is_recent = (now - published_at).num_days() < RECENT_WINDOW_DAYS;

            out.push(Notice {
                id: 0, // assigned after sorting
                title,
                link: rec.link.trim().to_string(),
                description,
                category,
                published_at,
                is_recent,
            });
        }

        out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        out.truncate(self.max_records);
        for (i, n) in out.iter_mut().enumerate() {
            n.id = (i + 1) as u32;
        }

        counter!("parse_dropped_total").increment(dropped as u64);
        histogram!("parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        out
    }
}
