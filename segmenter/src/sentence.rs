//! Sentence boundary scanning for CJK and Latin prose.

/// Characters that terminate a sentence. CJK and Latin forms both count;
/// semicolons close a sentence the same as periods.
const TERMINATORS: &[char] = &['。', '！', '？', '；', '.', '!', '?', '…'];

/// Closing quotes and brackets that belong to the sentence they follow.
const TRAILING_CLOSERS: &[char] = &['"', '\'', '”', '’', '）', '》', '」', '】'];

/// A contiguous sentence within the scanned text.
///
/// `start` and `end` are byte offsets into the original text; `text` is the
/// trimmed content. Spans are non-overlapping and in document order, and
/// together they cover the input up to surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Whether `c` ends a sentence.
pub(crate) fn is_terminator(c: char) -> bool {
    TERMINATORS.contains(&c)
}

fn is_trailing_closer(c: char) -> bool {
    TRAILING_CLOSERS.contains(&c)
}

/// Scan `text` left to right into sentence spans.
///
/// A sentence accumulates until a terminator is seen; immediately repeated
/// terminators (`？！`, `...`) and any closing quotes/brackets that follow
/// are absorbed into the same span. Trailing unterminated text becomes one
/// final span. Empty input yields an empty list.
pub fn scan_sentences(text: &str) -> Vec<SentenceSpan> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut span_start: Option<usize> = None;

    while let Some((idx, ch)) = chars.next() {
        let start = *span_start.get_or_insert(idx);

        if !is_terminator(ch) {
            continue;
        }

        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next_ch)) = chars.peek() {
            if is_terminator(next_ch) {
                end = next_idx + next_ch.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        while let Some(&(next_idx, next_ch)) = chars.peek() {
            if is_trailing_closer(next_ch) {
                end = next_idx + next_ch.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let trimmed = text[start..end].trim();
        if !trimmed.is_empty() {
            spans.push(SentenceSpan {
                text: trimmed.to_string(),
                start,
                end,
            });
        }
        span_start = None;
    }

    if let Some(start) = span_start {
        let trimmed = text[start..].trim();
        if !trimmed.is_empty() {
            spans.push(SentenceSpan {
                text: trimmed.to_string(),
                start,
                end: text.len(),
            });
        }
    }

    spans
}

/// Sentence contents only, without offsets.
pub(crate) fn sentence_texts(text: &str) -> Vec<String> {
    scan_sentences(text).into_iter().map(|s| s.text).collect()
}
