//! Recursive separator-priority chunking.
//!
//! A general string-splitting primitive independent of sentence semantics:
//! it walks a prioritized separator list from coarse (blank lines) to fine
//! (single characters), splits on the first separator present, merges the
//! pieces back up to the chunk size with an optional sliding-window
//! overlap, and recurses into finer separators for pieces that are still
//! too large. Unlike the document segmenter it enforces only an upper
//! bound; use it when overlap between chunks matters more than strict
//! uniformity.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::length::smart_length;

/// Default chunk size, matching the segmenter's maximum segment length.
pub const DEFAULT_CHUNK_SIZE: usize = 600;

/// Separators tried from coarsest to finest; the empty string means
/// character-level splitting and always matches.
const DEFAULT_SEPARATORS: &[&str] = &[
    "\n\n\n", "\n\n", "\n", "。", "！", "？", "；", ".", "!", "?", ";", "，", ",", " ", "",
];

/// How chunk lengths are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthMode {
    /// Plain character count.
    #[default]
    Chars,
    /// Script-aware effective length (see [`smart_length`]).
    Weighted,
}

impl LengthMode {
    fn measure(self, text: &str) -> usize {
        match self {
            LengthMode::Chars => text.chars().count(),
            LengthMode::Weighted => smart_length(text),
        }
    }
}

/// Content categories with curated separator priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Chapter and paragraph breaks first, then dialogue-closing
    /// punctuation.
    Novel,
    /// Keeps quoted exchanges intact as long as possible.
    Dialogue,
    /// Paragraphs, then sentences in either script.
    Article,
    #[default]
    General,
}

impl ContentType {
    fn separators(self) -> Vec<String> {
        let list: &[&str] = match self {
            ContentType::Novel => &[
                "\n\n\n", "\n\n", "。\"", "！\"", "？\"", "。", "！", "？", "\n", "；", "，",
                " ", "",
            ],
            ContentType::Dialogue => &[
                "\n\n", "。\"", "！\"", "？\"", "\"", "\n", "。", "！", "？", "，", " ", "",
            ],
            ContentType::Article => &[
                "\n\n", "\n", "。", "！", "？", ".", "!", "?", "；", ";", "，", ",", " ", "",
            ],
            ContentType::General => DEFAULT_SEPARATORS,
        };
        list.iter().map(|s| s.to_string()).collect()
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Upper bound for merged chunks.
    pub chunk_size: usize,
    /// Trailing overlap carried into the next chunk; defaults to a tenth
    /// of the chunk size.
    pub chunk_overlap: Option<usize>,
    /// Separator priority list; defaults to [`DEFAULT_SEPARATORS`].
    pub separators: Option<Vec<String>>,
    /// Keep each separator attached to the piece it ends.
    pub keep_separator: bool,
    pub length_mode: LengthMode,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: None,
            separators: None,
            keep_separator: true,
            length_mode: LengthMode::default(),
        }
    }
}

/// Options for [`smart_split`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmartChunkOptions {
    pub content_type: ContentType,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

/// A chunk with its cumulative position over the emitted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub start: usize,
    pub end: usize,
    pub length: usize,
}

/// Recursive separator-priority chunker.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    keep_separator: bool,
    length_mode: LengthMode,
}

impl RecursiveChunker {
    /// Create a chunker, rejecting an overlap as large as the chunk size.
    pub fn new(options: ChunkOptions) -> Result<Self> {
        let chunk_size = options.chunk_size;
        let chunk_overlap = options.chunk_overlap.unwrap_or(chunk_size / 10);

        if chunk_overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }

        let separators = options
            .separators
            .unwrap_or_else(|| DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect());

        debug!(
            "chunker ready (size {}, overlap {}, {} separators)",
            chunk_size,
            chunk_overlap,
            separators.len()
        );

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
            keep_separator: options.keep_separator,
            length_mode: options.length_mode,
        })
    }

    fn measure(&self, text: &str) -> usize {
        self.length_mode.measure(text)
    }

    /// Split `text` into chunks of at most the configured size (pieces
    /// with no finer separator left may still exceed it).
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &self.separators)
    }

    /// Like [`split_text`](Self::split_text), annotating each chunk with
    /// its cumulative character range over the emitted content.
    pub fn split_with_metadata(&self, text: &str) -> Vec<Chunk> {
        let mut position = 0;
        self.split_text(text)
            .into_iter()
            .map(|content| {
                let chars = content.chars().count();
                let start = position;
                position += chars;
                Chunk {
                    length: self.measure(&content),
                    start,
                    end: position,
                    content,
                }
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Pick the first separator that occurs; the empty string always
        // does.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (index, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() || text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[index + 1..];
                break;
            }
        }

        let splits = split_on_separator(text, separator, self.keep_separator);
        let joiner = if self.keep_separator { "" } else { separator };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in splits {
            if self.measure(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_pieces(&pending, joiner));
                pending.clear();
            }

            if finer.is_empty() {
                // Nothing finer to recurse into; emit oversized as-is.
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_pieces(&pending, joiner));
        }

        chunks
    }

    /// Greedily merge small pieces up to the chunk size, retaining a
    /// trailing window of up to the configured overlap into the next
    /// chunk.
    fn merge_pieces(&self, pieces: &[String], joiner: &str) -> Vec<String> {
        let joiner_len = joiner.chars().count();
        let mut merged = Vec::new();
        let mut window: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let length = self.measure(piece);
            let join_cost = if window.is_empty() { 0 } else { joiner_len };

            if total + length + join_cost > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "chunk grew to {} over configured size {}",
                        total, self.chunk_size
                    );
                }

                if !window.is_empty() {
                    if let Some(chunk) = join_pieces(&window, joiner) {
                        merged.push(chunk);
                    }

                    // Slide the window: drop from the front until what
                    // remains fits as overlap and leaves room for the
                    // incoming piece.
                    while total > self.chunk_overlap
                        || (total + length + if window.is_empty() { 0 } else { joiner_len }
                            > self.chunk_size
                            && total > 0)
                    {
                        let Some(first) = window.front() else { break };
                        let shed =
                            self.measure(first) + if window.len() > 1 { joiner_len } else { 0 };
                        total = total.saturating_sub(shed);
                        window.pop_front();
                    }
                }
            }

            window.push_back(piece.clone());
            total += length + if window.len() > 1 { joiner_len } else { 0 };
        }

        if let Some(chunk) = join_pieces(&window, joiner) {
            merged.push(chunk);
        }

        merged
    }
}

/// Split on a content type's curated separators with overlap retention.
pub fn smart_split(text: &str, options: SmartChunkOptions) -> Result<Vec<String>> {
    let chunker = RecursiveChunker::new(ChunkOptions {
        chunk_size: options.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        chunk_overlap: options.chunk_overlap,
        separators: Some(options.content_type.separators()),
        keep_separator: true,
        ..ChunkOptions::default()
    })?;
    Ok(chunker.split_text(text))
}

fn split_on_separator(text: &str, separator: &str, keep_separator: bool) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(|c| c.to_string()).collect();
    }

    let parts: Vec<&str> = text.split(separator).collect();
    let mut splits = Vec::new();

    if keep_separator {
        let count = parts.len();
        for (index, part) in parts.iter().enumerate() {
            if index < count - 1 {
                splits.push(format!("{part}{separator}"));
            } else if !part.is_empty() {
                splits.push(part.to_string());
            }
        }
    } else {
        splits.extend(parts.iter().map(|p| p.to_string()));
    }

    splits.into_iter().filter(|s| !s.is_empty()).collect()
}

fn join_pieces(pieces: &VecDeque<String>, joiner: &str) -> Option<String> {
    let joined = pieces
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(joiner)
        .trim()
        .to_string();
    if joined.is_empty() { None } else { Some(joined) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize, separators: &[&str]) -> RecursiveChunker {
        RecursiveChunker::new(ChunkOptions {
            chunk_size: size,
            chunk_overlap: Some(overlap),
            separators: Some(separators.iter().map(|s| s.to_string()).collect()),
            ..ChunkOptions::default()
        })
        .expect("options are consistent")
    }

    #[test]
    fn test_rejects_overlap_at_chunk_size() {
        let result = RecursiveChunker::new(ChunkOptions {
            chunk_size: 50,
            chunk_overlap: Some(50),
            ..ChunkOptions::default()
        });
        assert_eq!(
            result.err(),
            Some(ConfigError::OverlapTooLarge {
                overlap: 50,
                size: 50
            })
        );
    }

    #[test]
    fn test_default_overlap_is_tenth_of_size() {
        // 600 / 10 = 60 < 600, so defaults construct cleanly.
        assert!(RecursiveChunker::new(ChunkOptions::default()).is_ok());
    }

    #[test]
    fn test_empty_text() {
        let chunker = chunker(50, 10, &["。"]);
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("   ").is_empty());
    }

    #[test]
    fn test_single_small_text_is_one_chunk() {
        let chunker = chunker(50, 10, &["。"]);
        assert_eq!(chunker.split_text("测"), vec!["测"]);
    }

    #[test]
    fn test_keeps_separator_at_piece_end() {
        let chunker = chunker(8, 0, &["。"]);
        let chunks = chunker.split_text("第一句。第二句。第三句。");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.ends_with('。') || !chunk.contains('。'));
        }
    }

    #[test]
    fn test_merges_pieces_under_chunk_size() {
        let chunker = chunker(30, 0, &["。"]);
        let chunks = chunker.split_text("短句。又一句。再一句。");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "短句。又一句。再一句。");
    }

    #[test]
    fn test_recurses_into_finer_separators() {
        let chunker = chunker(12, 0, &["\n\n", "\n", "。", "，"]);
        let text = "第一段第一句，第二句。\n\n第二段第一句，第二句。";
        let chunks = chunker.split_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 13, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn test_character_level_fallback() {
        let chunker = chunker(5, 0, &["。", ""]);
        let chunks = chunker.split_text("这是一个很长的没有标点的句子");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 5);
        }
    }

    #[test]
    fn test_overlap_repeats_tail_in_next_chunk() {
        let chunker = chunker(10, 5, &["。"]);
        let chunks = chunker.split_text("一二三四。五六七八。九十甲乙。");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "一二三四。五六七八。");
        // The second chunk re-opens with the previous chunk's tail
        // sentence.
        assert_eq!(chunks[1], "五六七八。九十甲乙。");
    }

    #[test]
    fn test_split_with_metadata_positions() {
        let chunker = chunker(6, 0, &["。"]);
        let chunks = chunker.split_with_metadata("一二三。四五六。");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, 4);
        assert_eq!(chunks[1].start, 4);
        assert_eq!(chunks[1].end, 8);
    }

    #[test]
    fn test_weighted_length_mode() {
        let chunker = RecursiveChunker::new(ChunkOptions {
            chunk_size: 8,
            chunk_overlap: Some(0),
            separators: Some(vec![" ".to_string()]),
            length_mode: LengthMode::Weighted,
            ..ChunkOptions::default()
        })
        .expect("options are consistent");
        // Each word weighs one unit under the weighted metric, so all six
        // merge into a single chunk despite spanning 35 characters.
        let chunks = chunker.split_text("alpha beta gamma delta epsilon zeta");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_smart_split_novel_content() {
        let text = "第一章\n\n他说：“今天天气真好。”然后离开了。\n\n第二章开始了。";
        let chunks = smart_split(
            text,
            SmartChunkOptions {
                content_type: ContentType::Novel,
                chunk_size: Some(15),
                chunk_overlap: Some(0),
            },
        )
        .expect("options are consistent");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_smart_split_rejects_bad_overlap() {
        let result = smart_split(
            "text",
            SmartChunkOptions {
                content_type: ContentType::General,
                chunk_size: Some(10),
                chunk_overlap: Some(10),
            },
        );
        assert!(result.is_err());
    }
}
