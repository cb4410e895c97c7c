//! Segment records returned to callers.

use serde::{Deserialize, Serialize};

use crate::length::smart_length;

/// Why a segment was cut where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    /// Flushed at a sentence boundary by the greedy accumulator.
    SentenceBoundary,
    /// Produced by the optimal sentence-level partition.
    DpOptimized,
    /// Cut at a paragraph boundary by the fallback accumulator.
    Paragraph,
    /// A single sentence longer than the maximum, kept whole rather than
    /// truncated.
    LongSentence,
    /// Cut without a sentence boundary nearby; last resort.
    Forced,
    /// The terminal segment of the document, exempt from the minimum
    /// length bound.
    FinalSegment,
    /// Rebuilt by the balancer from undersized neighbors.
    MergedForBalance,
}

/// Bookkeeping attached to each segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub break_reason: BreakReason,
    /// Content absorbed at least one neighboring piece.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub merged: bool,
    /// Content was re-split from a larger piece.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub split: bool,
    /// Content lost text to a hard cut. Never set by the current
    /// strategies; present for downstream compatibility.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// One unit of segmented output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Trimmed segment text.
    pub content: String,
    /// Effective length of `content`.
    pub length: usize,
    /// Zero-based position in the final document order.
    pub order: usize,
    pub metadata: SegmentMetadata,
}

impl Segment {
    /// Create a segment from raw content, trimming it and computing its
    /// effective length.
    pub(crate) fn new(content: &str, order: usize, reason: BreakReason) -> Self {
        let content = content.trim().to_string();
        let length = smart_length(&content);
        Self {
            content,
            length,
            order,
            metadata: SegmentMetadata {
                break_reason: reason,
                merged: false,
                split: false,
                truncated: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_measures() {
        let segment = Segment::new("  这是中文  ", 3, BreakReason::Paragraph);
        assert_eq!(segment.content, "这是中文");
        assert_eq!(segment.length, 4);
        assert_eq!(segment.order, 3);
        assert_eq!(segment.metadata.break_reason, BreakReason::Paragraph);
        assert!(!segment.metadata.merged);
    }

    #[test]
    fn test_break_reason_serializes_snake_case() {
        let segment = Segment::new("text.", 0, BreakReason::DpOptimized);
        let json = serde_json::to_string(&segment).expect("segment should serialize");
        assert!(json.contains("\"break_reason\":\"dp_optimized\""));
        // Unset flags are omitted.
        assert!(!json.contains("merged"));
    }

    #[test]
    fn test_metadata_flags_round_trip() {
        let mut segment = Segment::new("a.", 0, BreakReason::Forced);
        segment.metadata.merged = true;
        let json = serde_json::to_string(&segment).expect("segment should serialize");
        let back: Segment = serde_json::from_str(&json).expect("segment should deserialize");
        assert!(back.metadata.merged);
        assert!(!back.metadata.split);
    }
}
