// src/parse/feed.rs
//! RSS/XML alternate path for sources that expose a feed instead of a
//! board page. Same per-item drop discipline as the HTML extractor.

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::RawRecord;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

pub(crate) fn extract_records(xml: &str) -> Result<Vec<RawRecord>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing notice feed xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = it.title.unwrap_or_default();
        if title.trim().is_empty() {
            continue;
        }
        out.push(RawRecord {
            title,
            link: it.link.unwrap_or_default(),
            description: it.description.unwrap_or_default(),
            date_text: it.pub_date.unwrap_or_default(),
            category_hint: it.category,
        });
    }
    Ok(out)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
