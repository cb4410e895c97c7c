//! Script-aware text length measurement.
//!
//! Narration pacing depends on spoken weight, not byte count: a CJK
//! character carries about as much speech as an English word pair. Every
//! bounds comparison in this crate goes through this metric so that mixed
//! Chinese/English text segments evenly.

use once_cell::sync::Lazy;
use regex::Regex;

/// CJK ideographs plus CJK symbols/punctuation and full-width forms.
static CJK_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{4e00}-\u{9fff}\u{3000}-\u{303f}\u{ff00}-\u{ffef}]")
        .expect("CJK character class should compile")
});

/// Runs of Latin letters, counted as words.
static LATIN_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+").expect("Latin word pattern should compile"));

/// Runs of decimal digits, counted as single tokens.
static NUMBER_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("number pattern should compile"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Compute the effective length of a text span.
///
/// Counts each CJK character (including CJK punctuation) as 1, each run of
/// Latin letters as half a unit (rounded up over the whole text), and each
/// run of digits as 1. Whitespace is collapsed before counting.
pub fn smart_length(text: &str) -> usize {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");

    let cjk = CJK_CHARS.find_iter(&collapsed).count();
    let words = LATIN_WORDS.find_iter(&collapsed).count();
    let numbers = NUMBER_TOKENS.find_iter(&collapsed).count();

    cjk + words.div_ceil(2) + numbers
}

/// Length used for bounds checks: the larger of the effective length and
/// the trimmed character count. Guards against spans that are
/// effective-length-short but character-long (symbol runs, bare
/// punctuation), which would otherwise overrun downstream consumers.
pub(crate) fn measured_length(text: &str) -> usize {
    let trimmed = text.trim();
    smart_length(trimmed).max(trimmed.chars().count())
}
