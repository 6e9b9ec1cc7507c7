// src/analysis/report.rs
//! Structured analysis result and its extraction from free-text responses.
//!
//! The remote capability answers with prose that embeds a JSON payload.
//! Extraction locates the outermost `{...}` block; any failure degrades to
//! a raw-text report so downstream chunking always receives a string.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisReport {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub category: String,
    pub title: String,
    pub summary: String,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub key_phrases: Vec<String>,
    pub extracted_text: String,
    pub key_information: serde_json::Value,
}

impl AnalysisReport {
    /// Parse a remote response. Structured payload when possible, degraded
    /// raw-text report otherwise. A structurally-valid payload carrying no
    /// usable text degrades the same way.
    pub fn from_response_text(raw: &str) -> Self {
        if let Some(json) = extract_embedded_json(raw) {
            if let Ok(report) = serde_json::from_str::<AnalysisReport>(json) {
                if !report.extracted_text.trim().is_empty() || !report.summary.trim().is_empty() {
                    return report;
                }
            }
        }
        Self::degraded(raw)
    }

    /// Raw text as summary and extracted text, empty structured fields.
    pub fn degraded(raw: &str) -> Self {
        let text = raw.trim().to_string();
        Self {
            summary: text.clone(),
            extracted_text: text,
            ..Self::default()
        }
    }
}

/// Greedy outermost-brace scan. Byte indices are safe to slice on because
/// `{` and `}` are ASCII.
fn extract_embedded_json(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_payload_is_located_through_prose() {
        let raw = r#"Sure! Here is the analysis you asked for:
            {"type":"notice","category":"Academic","title":"Exam schedule",
             "summary":"Midterm dates.","topics":["exams"],"entities":[],
             "keyPhrases":["midterm"],"extractedText":"Midterms run in week 8.",
             "keyInformation":{"week":8}}
            Let me know if you need anything else."#;

        let report = AnalysisReport::from_response_text(raw);
        assert_eq!(report.doc_type, "notice");
        assert_eq!(report.extracted_text, "Midterms run in week 8.");
        assert_eq!(report.topics, vec!["exams"]);
        assert_eq!(report.key_information["week"], 8);
    }

    #[test]
    fn unparseable_response_degrades_to_raw_text() {
        let raw = "The document appears to describe tuition deadlines.";
        let report = AnalysisReport::from_response_text(raw);
        assert_eq!(report.extracted_text, raw);
        assert_eq!(report.summary, raw);
        assert!(report.topics.is_empty());
        assert!(report.entities.is_empty());
    }

    #[test]
    fn empty_structured_payload_degrades_too() {
        let raw = "prefix {\"unrelated\": true} suffix";
        let report = AnalysisReport::from_response_text(raw);
        assert_eq!(report.extracted_text, raw.trim());
        assert!(report.topics.is_empty());
    }

    #[test]
    fn mismatched_braces_do_not_panic() {
        let report = AnalysisReport::from_response_text("} backwards {");
        assert_eq!(report.extracted_text, "} backwards {");
    }
}
