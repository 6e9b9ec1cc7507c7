// src/chunk.rs
//! Paragraph/sentence-aware text chunking.
//!
//! Pure function, no I/O. Sizes are counted in characters, not tokens.
//! Overlap between consecutive chunks is produced by re-seeding the next
//! buffer with the closing sentences of the previous chunk rather than by
//! exact character truncation, which would split sentences mid-word.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use crate::config::{
    DEFAULT_MAX_CHUNK_CHARS, DEFAULT_MIN_CHUNK_CHARS, DEFAULT_OVERLAP_TARGET_CHARS,
};

/// A bounded text segment prepared for embedding/storage.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Hard ceiling for a chunk, except a lone oversized paragraph.
    pub max_chars: usize,
    /// Advisory overlap size; the two-sentence seed is trimmed to one
    /// sentence when it overshoots twice this value.
    pub overlap_target_chars: usize,
    /// Chunks must exceed this floor; anything at or below it carries too
    /// little context for retrieval and is dropped.
    pub min_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHUNK_CHARS,
            overlap_target_chars: DEFAULT_OVERLAP_TARGET_CHARS,
            min_chars: DEFAULT_MIN_CHUNK_CHARS,
        }
    }
}

fn blank_line_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\r?\n\s*\r?\n").unwrap())
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").unwrap())
}

/// Split `text` into bounded, overlapping chunks.
///
/// Paragraphs (blank-line separated) are accumulated greedily. When the next
/// paragraph would push the buffer past `max_chars`, the buffer is emitted
/// and the next one is seeded with the last two sentence fragments of the
/// emitted chunk, so consecutive chunks share context.
pub fn chunk_text(text: &str, cfg: &ChunkConfig) -> Vec<Chunk> {
    let paragraphs: Vec<&str> = blank_line_re()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut closed: Vec<String> = Vec::new();
    let mut buf = String::new();

    for para in paragraphs {
        let para_chars = para.chars().count();
        let buf_chars = buf.chars().count();

        if !buf.is_empty() && buf_chars + 2 + para_chars > cfg.max_chars {
            let finished = buf.trim().to_string();
            let seed = overlap_seed(&finished, cfg.overlap_target_chars);
            closed.push(finished);
            buf = if seed.is_empty() {
                para.to_string()
            } else {
                format!("{seed}\n\n{para}")
            };
        } else {
            if !buf.is_empty() {
                buf.push_str("\n\n");
            }
            buf.push_str(para);
        }
    }

    if !buf.trim().is_empty() {
        closed.push(buf.trim().to_string());
    }

    closed
        .into_iter()
        .filter(|c| c.chars().count() > cfg.min_chars)
        .enumerate()
        .map(|(index, text)| Chunk { text, index })
        .collect()
}

/// Last two sentence fragments of `chunk`, joined by `". "`. Falls back to
/// the final fragment alone when two of them overshoot twice the target.
fn overlap_seed(chunk: &str, overlap_target_chars: usize) -> String {
    let fragments: Vec<&str> = sentence_end_re()
        .split(chunk)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if fragments.is_empty() {
        return String::new();
    }

    let tail: Vec<&str> = fragments
        .iter()
        .rev()
        .take(2)
        .rev()
        .copied()
        .collect();
    let seed = tail.join(". ");

    if tail.len() == 2 && seed.chars().count() > overlap_target_chars * 2 {
        return tail[1].to_string();
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: usize, overlap: usize, min: usize) -> ChunkConfig {
        ChunkConfig {
            max_chars: max,
            overlap_target_chars: overlap,
            min_chars: min,
        }
    }

    fn para(sentences: usize, tag: &str) -> String {
        (0..sentences)
            .map(|i| format!("Sentence {i} of block {tag} carries enough words to matter."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn two_short_paragraphs_become_one_chunk() {
        let text = "Para one text here.\n\nPara two text here.";
        let chunks = chunk_text(text, &cfg(1500, 200, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Para one text here.\n\nPara two text here.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn long_text_splits_and_respects_ceiling() {
        let text = (0..12)
            .map(|i| para(4, &i.to_string()))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert!(text.chars().count() > 1500);

        let chunks = chunk_text(&text, &cfg(1500, 200, 100));
        assert!(chunks.len() >= 2);
        for c in &chunks[..chunks.len() - 1] {
            assert!(c.text.chars().count() <= 1500, "chunk over ceiling");
        }
        // Indexes are contiguous.
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
        }
    }

    #[test]
    fn short_input_yields_nothing() {
        let chunks = chunk_text("Too short to store.", &ChunkConfig::default());
        assert!(chunks.is_empty());

        // Exactly at the floor is still dropped.
        let at_floor: String = "x".repeat(DEFAULT_MIN_CHUNK_CHARS);
        assert!(chunk_text(&at_floor, &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn consecutive_chunks_overlap_by_trailing_sentences() {
        let first = para(5, "alpha");
        let second = para(5, "beta");
        let text = format!("{first}\n\n{second}");
        let max = first.chars().count() + 10; // force a split at the boundary
        let chunks = chunk_text(&text, &cfg(max, 200, 10));

        assert_eq!(chunks.len(), 2);
        // The second chunk opens with material from the first.
        assert!(chunks[1].text.contains("block alpha"));
        assert!(chunks[1].text.contains("block beta"));
    }

    #[test]
    fn paragraph_order_is_preserved() {
        let blocks: Vec<String> = (0..8).map(|i| para(3, &format!("ord{i}"))).collect();
        let text = blocks.join("\n\n");
        let chunks = chunk_text(&text, &cfg(900, 150, 50));

        // First occurrence of each block tag must be non-decreasing across chunks.
        let mut last_seen = 0usize;
        for (i, block) in blocks.iter().enumerate() {
            let tag = format!("block ord{i}");
            let pos = chunks
                .iter()
                .position(|c| c.text.contains(&tag))
                .unwrap_or_else(|| panic!("{block} lost"));
            assert!(pos >= last_seen, "paragraph order broken");
            last_seen = pos;
        }
    }

    #[test]
    fn whitespace_only_paragraphs_are_discarded() {
        let text = "First real paragraph with a reasonable amount of text in it.\n\n   \n\nSecond real paragraph with a reasonable amount of text in it.";
        let chunks = chunk_text(text, &cfg(1500, 200, 20));
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.contains("   \n"));
    }

    #[test]
    fn overlap_seed_takes_last_two_sentences() {
        let seed = overlap_seed("One here. Two here. Three here.", 200);
        assert_eq!(seed, "Two here. Three here");
    }

    #[test]
    fn oversized_seed_falls_back_to_final_sentence() {
        let long_a = "a".repeat(300);
        let long_b = "b".repeat(300);
        let seed = overlap_seed(&format!("{long_a}. {long_b}."), 100);
        assert_eq!(seed, long_b);
    }
}
