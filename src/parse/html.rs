// src/parse/html.rs
//! CSS-selector extraction for institutional notice-board markup.
//!
//! Boards vary between table layouts and list layouts; selectors are tried
//! in priority order and the first shape that yields rows wins. A row that
//! lacks a usable title cell is skipped, not an error.

use scraper::{ElementRef, Html, Selector};

use super::RawRecord;

const ROW_SELECTORS: &[&str] = &[
    "table.board-list tbody tr",
    "table tbody tr",
    "ul.board-list li",
    "ul.notice-list li",
    "div.notice-list article",
];

const TITLE_SELECTORS: &[&str] = &["td.title a", "a.title", ".subject a", "td a", "a"];
const DATE_SELECTORS: &[&str] = &["td.date", ".date", "time", "span.regdate"];
const CATEGORY_SELECTORS: &[&str] = &["td.category", ".category", ".label"];
const DESCRIPTION_SELECTORS: &[&str] = &["td.desc", ".summary", "p"];

pub(crate) fn extract_records(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    let rows = first_matching_rows(&document);
    if rows.is_empty() {
        tracing::warn!("no notice rows matched any known board layout");
        return Vec::new();
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match extract_row(&row) {
            Some(rec) => out.push(rec),
            None => {
                tracing::debug!(row = %row.html().chars().take(120).collect::<String>(), "skipping malformed row");
            }
        }
    }
    out
}

fn first_matching_rows<'a>(document: &'a Html) -> Vec<ElementRef<'a>> {
    for sel_str in ROW_SELECTORS {
        if let Ok(sel) = Selector::parse(sel_str) {
            let rows: Vec<ElementRef<'a>> = document.select(&sel).collect();
            if !rows.is_empty() {
                return rows;
            }
        }
    }
    Vec::new()
}

fn extract_row(row: &ElementRef<'_>) -> Option<RawRecord> {
    // Title is the one field a row cannot do without.
    let (title, link) = first_anchor(row)?;

    Some(RawRecord {
        title,
        link,
        description: first_text(row, DESCRIPTION_SELECTORS).unwrap_or_default(),
        date_text: first_text(row, DATE_SELECTORS).unwrap_or_default(),
        category_hint: first_text(row, CATEGORY_SELECTORS),
    })
}

fn first_anchor(row: &ElementRef<'_>) -> Option<(String, String)> {
    for sel_str in TITLE_SELECTORS {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(el) = row.select(&sel).next() {
                let title = element_text(&el);
                if title.is_empty() {
                    continue;
                }
                let link = el.value().attr("href").unwrap_or_default().to_string();
                return Some((title, link));
            }
        }
    }
    None
}

fn first_text(row: &ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for sel_str in selectors {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(el) = row.select(&sel).next() {
                let text = element_text(&el);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn element_text(el: &ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in el.text() {
        let trimmed = node.trim();
        if !trimmed.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(trimmed);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"
        <html><body>
        <table class="board-list"><tbody>
          <tr>
            <td class="category">Academic</td>
            <td class="title"><a href="/notice/101">Fall semester registration opens</a></td>
            <td class="date">2026-08-01</td>
          </tr>
          <tr>
            <td class="category"></td>
            <td class="title"><!-- no anchor, corrupt row --></td>
            <td class="date">2026-07-30</td>
          </tr>
          <tr>
            <td class="category">Event</td>
            <td class="title"><a href="/notice/99">Autumn festival volunteers wanted</a></td>
            <td class="date">2026-07-28</td>
          </tr>
        </tbody></table>
        </body></html>
    "#;

    #[test]
    fn corrupt_row_is_skipped_not_fatal() {
        let recs = extract_records(BOARD);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Fall semester registration opens");
        assert_eq!(recs[0].link, "/notice/101");
        assert_eq!(recs[0].category_hint.as_deref(), Some("Academic"));
        assert_eq!(recs[1].date_text, "2026-07-28");
    }

    #[test]
    fn list_layout_is_a_fallback_shape() {
        let html = r#"
            <ul class="notice-list">
              <li><a href="/n/1">Tuition payment deadline extended</a><span class="date">2026-08-02</span></li>
            </ul>
        "#;
        let recs = extract_records(html);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Tuition payment deadline extended");
    }

    #[test]
    fn empty_page_yields_empty_batch() {
        assert!(extract_records("<html><body><p>maintenance</p></body></html>").is_empty());
    }
}
