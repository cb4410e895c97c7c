//! Advisory quality checks over a finished segment list.

use serde::{Deserialize, Serialize};

use crate::segment::{BreakReason, Segment};
use crate::splitter::SplitOptions;

/// Aggregate figures for a segment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityStats {
    pub total_segments: usize,
    pub avg_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Non-terminal segments within `target ± tolerance`.
    pub segments_in_range: usize,
}

/// Validation outcome: findings are advisory, callers decide whether to
/// act on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub stats: QualityStats,
}

/// Whether a segment's content ends on sentence or clause punctuation.
fn ends_on_punctuation(content: &str) -> bool {
    content
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| matches!(c, '。' | '！' | '？' | '；' | '：' | '.' | '!' | '?' | ';' | ':'))
}

/// Inspect `segments` against the configured bounds.
///
/// The terminal segment is exempt from both bounds, and segments tagged
/// [`BreakReason::LongSentence`] are exempt from the maximum (they are a
/// deliberate escape hatch). A `forced` segment that does not end on
/// punctuation is flagged as a likely mid-sentence cut.
pub fn validate_segments(segments: &[Segment], options: &SplitOptions) -> QualityReport {
    let mut issues = Vec::new();
    let mut total_length = 0usize;
    let mut in_range = 0usize;

    let count = segments.len();
    for (index, segment) in segments.iter().enumerate() {
        let is_last = index == count - 1;
        let is_long_sentence = segment.metadata.break_reason == BreakReason::LongSentence;
        let trimmed_chars = segment.content.trim().chars().count();
        let effective = segment.length.max(trimmed_chars);

        total_length += effective;

        if !is_last && !is_long_sentence && effective > options.max_length {
            issues.push(format!(
                "segment {} exceeds max length: {} > {}",
                segment.order, effective, options.max_length
            ));
        }

        if !is_last && !is_long_sentence && effective < options.min_length {
            issues.push(format!(
                "segment {} is below min length: {} < {}",
                segment.order, effective, options.min_length
            ));
        }

        if !is_last && effective.abs_diff(options.target_length) <= options.tolerance {
            in_range += 1;
        }

        if segment.metadata.break_reason == BreakReason::Forced
            && !ends_on_punctuation(&segment.content)
        {
            issues.push(format!(
                "segment {} may be cut mid-sentence",
                segment.order
            ));
        }
    }

    let lengths = segments
        .iter()
        .map(|s| s.length.max(s.content.trim().chars().count()));
    let stats = QualityStats {
        total_segments: count,
        avg_length: if count > 0 { total_length / count } else { 0 },
        min_length: lengths.clone().min().unwrap_or(0),
        max_length: lengths.max().unwrap_or(0),
        segments_in_range: in_range,
    };

    QualityReport {
        valid: issues.is_empty(),
        issues,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::{SmartSplitter, SplitOptions};

    fn options(target: usize, max: usize, min: usize, tolerance: usize) -> SplitOptions {
        SplitOptions {
            target_length: target,
            max_length: max,
            min_length: min,
            tolerance,
            ..SplitOptions::default()
        }
    }

    #[test]
    fn test_well_formed_split_passes() {
        let opts = options(30, 50, 10, 20);
        let splitter = SmartSplitter::new(opts.clone()).expect("bounds are consistent");
        let segments = splitter.split(&"第一句话。第二句话。第三句话。".repeat(20));
        let report = validate_segments(&segments, &opts);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
        assert_eq!(report.stats.total_segments, segments.len());
    }

    #[test]
    fn test_flags_oversized_segment() {
        let opts = options(30, 50, 10, 20);
        let segments = vec![
            Segment::new(&"超长内容".repeat(20), 0, BreakReason::SentenceBoundary),
            Segment::new("结尾。", 1, BreakReason::FinalSegment),
        ];
        let report = validate_segments(&segments, &opts);
        assert!(!report.valid);
        assert!(report.issues.iter().any(|i| i.contains("max length")));
    }

    #[test]
    fn test_flags_undersized_segment() {
        let opts = options(30, 50, 10, 20);
        let segments = vec![
            Segment::new("短。", 0, BreakReason::SentenceBoundary),
            Segment::new(&"正常长度的段落内容就是这样。".repeat(2), 1, BreakReason::FinalSegment),
        ];
        let report = validate_segments(&segments, &opts);
        assert!(!report.valid);
        assert!(report.issues.iter().any(|i| i.contains("min length")));
    }

    #[test]
    fn test_long_sentence_is_exempt_from_max() {
        let opts = options(30, 50, 10, 20);
        let segments = vec![
            Segment::new(&"无法切分的长句".repeat(20), 0, BreakReason::LongSentence),
            Segment::new("结尾。", 1, BreakReason::FinalSegment),
        ];
        let report = validate_segments(&segments, &opts);
        assert!(report.valid, "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn test_terminal_segment_is_exempt() {
        let opts = options(30, 50, 10, 20);
        let segments = vec![Segment::new("短。", 0, BreakReason::FinalSegment)];
        let report = validate_segments(&segments, &opts);
        assert!(report.valid);
    }

    #[test]
    fn test_flags_forced_cut_without_punctuation() {
        let opts = options(30, 50, 10, 20);
        let segments = vec![
            Segment::new(&"被硬切开的内容没有标点".repeat(2), 0, BreakReason::Forced),
            Segment::new("结尾。", 1, BreakReason::FinalSegment),
        ];
        let report = validate_segments(&segments, &opts);
        assert!(report.issues.iter().any(|i| i.contains("mid-sentence")));
    }

    #[test]
    fn test_in_range_counts_non_terminal_only() {
        let opts = options(20, 50, 10, 5);
        let segments = vec![
            Segment::new(&"一".repeat(20), 0, BreakReason::SentenceBoundary),
            Segment::new(&"二".repeat(20), 1, BreakReason::FinalSegment),
        ];
        let report = validate_segments(&segments, &opts);
        assert_eq!(report.stats.segments_in_range, 1);
    }

    #[test]
    fn test_empty_list_stats() {
        let report = validate_segments(&[], &options(30, 50, 10, 20));
        assert!(report.valid);
        assert_eq!(report.stats.total_segments, 0);
        assert_eq!(report.stats.avg_length, 0);
        assert_eq!(report.stats.min_length, 0);
    }
}
