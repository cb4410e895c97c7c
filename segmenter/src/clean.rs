//! Input normalization applied before sentence scanning.

use once_cell::sync::Lazy;
use regex::Regex;

/// Three or more consecutive newlines collapse to a single blank line.
static EXTRA_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern should compile"));

/// Whitespace following CJK sentence punctuation is dropped; the
/// punctuation itself already carries the pause.
static CJK_PUNCT_SPACING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([。！？；，])\s+").expect("punctuation spacing pattern should compile"));

/// Paragraphs are separated by blank lines.
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern should compile"));

/// Normalize raw text for segmentation.
///
/// - Unifies `\r\n` and `\r` line endings to `\n`
/// - Collapses runs of blank lines to a single blank line
/// - Removes whitespace directly after CJK sentence punctuation
/// - Trims leading/trailing whitespace
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = EXTRA_BLANK_LINES.replace_all(&unified, "\n\n");
    let spaced = CJK_PUNCT_SPACING.replace_all(&collapsed, "${1}");
    spaced.trim().to_string()
}

/// Split normalized text into paragraphs on blank lines, dropping empty
/// entries.
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
