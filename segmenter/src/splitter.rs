//! Length-bounded document segmentation.
//!
//! The splitter first attempts a globally optimal sentence-level partition;
//! when none exists it falls back to paragraph accumulation with greedy
//! sentence packing, then normalizes the result with a balancing pass.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clean::{normalize_text, split_paragraphs};
use crate::dp::plan_segments;
use crate::error::{ConfigError, Result};
use crate::length::{measured_length, smart_length};
use crate::segment::{BreakReason, Segment};
use crate::sentence::{scan_sentences, sentence_texts};

/// Default target segment length.
pub const DEFAULT_TARGET_LENGTH: usize = 500;
/// Default hard upper bound.
pub const DEFAULT_MAX_LENGTH: usize = 600;
/// Default lower bound for non-terminal segments.
pub const DEFAULT_MIN_LENGTH: usize = 400;
/// Default uniformity tolerance around the target.
pub const DEFAULT_TOLERANCE: usize = 100;

/// When the greedy accumulator flushes its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flush once the buffer has reached the target and the next sentence
    /// would push past it. Keeps segments near the target.
    #[default]
    AtTarget,
    /// Let the buffer grow until the next sentence would exceed the
    /// maximum. Produces fewer, longer segments.
    AtMax,
}

/// Length bounds and splitting behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Preferred segment length.
    pub target_length: usize,
    /// Hard upper bound (except the long-sentence escape hatch).
    pub max_length: usize,
    /// Lower bound for all but the terminal segment.
    pub min_length: usize,
    /// Window around the target used by the quality validator.
    pub tolerance: usize,
    /// Whether hard splits seek the nearest punctuation instead of cutting
    /// at an exact character position.
    pub prefer_sentence_boundary: bool,
    /// Flush behavior of the greedy accumulator.
    pub flush_policy: FlushPolicy,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            target_length: DEFAULT_TARGET_LENGTH,
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            tolerance: DEFAULT_TOLERANCE,
            prefer_sentence_boundary: true,
            flush_policy: FlushPolicy::default(),
        }
    }
}

impl SplitOptions {
    /// Check the bounds invariants: `target <= max` and `min <= target`.
    pub fn validate(&self) -> Result<()> {
        if self.target_length > self.max_length {
            return Err(ConfigError::TargetAboveMax {
                target: self.target_length,
                max: self.max_length,
            });
        }
        if self.min_length > self.target_length {
            return Err(ConfigError::MinAboveTarget {
                min: self.min_length,
                target: self.target_length,
            });
        }
        Ok(())
    }
}

/// Sentence-aware splitter producing length-bounded segments.
///
/// Stateless between calls: each [`split`](SmartSplitter::split) allocates
/// its own working data, so one splitter can be shared freely across
/// threads.
#[derive(Debug, Clone)]
pub struct SmartSplitter {
    options: SplitOptions,
}

/// Split `text` with the given options, validating them first.
pub fn segment_text(text: &str, options: SplitOptions) -> Result<Vec<Segment>> {
    Ok(SmartSplitter::new(options)?.split(text))
}

impl Default for SmartSplitter {
    fn default() -> Self {
        Self {
            options: SplitOptions::default(),
        }
    }
}

impl SmartSplitter {
    /// Create a splitter, rejecting inconsistent bounds.
    pub fn new(options: SplitOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options this splitter was built with.
    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    /// Split `text` into ordered segments.
    ///
    /// Empty or whitespace-only input returns an empty list. Output orders
    /// are always `0..n-1` in document order.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        info!(
            "splitting {} chars (target {}, max {}, min {})",
            text.chars().count(),
            self.options.target_length,
            self.options.max_length,
            self.options.min_length
        );

        let clean = normalize_text(text);

        if let Some(segments) = self.segment_with_sentence_plan(&clean) {
            debug!("optimal partition produced {} segments", segments.len());
            return segments;
        }

        if measured_length(&clean) <= self.options.max_length {
            return vec![Segment::new(&clean, 0, BreakReason::Paragraph)];
        }

        let paragraphs = split_paragraphs(&clean);

        let segments = if paragraphs.len() == 1
            && measured_length(&paragraphs[0]) > self.options.max_length
        {
            // One long paragraph: split it directly, letting the true tail
            // of the document fall below the minimum.
            self.process_oversized_content(&paragraphs[0], 0, true)
        } else {
            self.accumulate_paragraphs(&paragraphs)
        };

        info!("produced {} segments via fallback path", segments.len());
        segments
    }

    /// Attempt the optimal sentence-level partition.
    fn segment_with_sentence_plan(&self, text: &str) -> Option<Vec<Segment>> {
        let sentences = scan_sentences(text);
        let plans = plan_segments(text, &sentences, &self.options)?;
        let count = plans.len();

        Some(
            plans
                .iter()
                .enumerate()
                .map(|(order, plan)| {
                    let content = &text[sentences[plan.start].start..sentences[plan.end].end];
                    let reason = if order == count - 1 {
                        BreakReason::FinalSegment
                    } else {
                        BreakReason::DpOptimized
                    };
                    Segment::new(content, order, reason)
                })
                .collect(),
        )
    }

    /// Merge paragraphs into segments, delegating oversized material to the
    /// greedy handler.
    fn accumulate_paragraphs(&self, paragraphs: &[String]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut order = 0;
        let count = paragraphs.len();

        for (index, paragraph) in paragraphs.iter().enumerate() {
            let paragraph_length = measured_length(paragraph);
            let is_last = index == count - 1;

            if paragraph_length > self.options.max_length {
                if !current.trim().is_empty() {
                    segments.push(Segment::new(&current, order, BreakReason::Paragraph));
                    order += 1;
                    current.clear();
                }
                let processed = self.process_oversized_content(paragraph, order, is_last);
                order += processed.len();
                segments.extend(processed);
                continue;
            }

            if current.is_empty() {
                current = paragraph.clone();
                continue;
            }

            let combined = format!("{current}\n\n{paragraph}");
            if measured_length(&combined) <= self.options.max_length {
                current = combined;
            } else if measured_length(&current) >= self.options.min_length {
                segments.push(Segment::new(&current, order, BreakReason::Paragraph));
                order += 1;
                current = paragraph.clone();
            } else {
                // The buffer alone is too short to stand; re-split the
                // combined text at sentence granularity instead.
                let processed = self.process_oversized_content(&combined, order, is_last);
                order += processed.len();
                segments.extend(processed);
                current.clear();
            }
        }

        if !current.trim().is_empty() {
            segments.push(Segment::new(&current, order, BreakReason::FinalSegment));
        }

        self.balance_segments(segments)
    }

    /// Greedy sentence accumulation for content without a valid optimal
    /// partition.
    ///
    /// `allow_flexible_final` marks the true tail of the document, which may
    /// fall below the minimum; interior tails instead merge backward into
    /// the previous segment when that fits.
    fn process_oversized_content(
        &self,
        content: &str,
        start_order: usize,
        allow_flexible_final: bool,
    ) -> Vec<Segment> {
        let segments = self.accumulate_sentences(content, start_order, allow_flexible_final);
        self.balance_segments(segments)
    }

    /// The greedy core of the oversized handler, without the trailing
    /// balancing pass. The balancer re-splits merged text through this
    /// directly; routing it back through the balanced variant could recurse
    /// forever on content that reproduces itself (an undersized head
    /// followed by an unsplittable oversized tail).
    fn accumulate_sentences(
        &self,
        content: &str,
        start_order: usize,
        allow_flexible_final: bool,
    ) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut order = start_order;

        for sentence in sentence_texts(content) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            let candidate = if current.is_empty() {
                sentence.to_string()
            } else {
                format!("{current} {sentence}")
            };
            let candidate_length = measured_length(&candidate);
            let current_length = measured_length(&current);

            if candidate_length <= self.options.max_length {
                let flush_early = self.options.flush_policy == FlushPolicy::AtTarget
                    && !current.is_empty()
                    && current_length >= self.options.target_length
                    && candidate_length > self.options.target_length;

                if flush_early {
                    segments.push(Segment::new(&current, order, BreakReason::SentenceBoundary));
                    order += 1;
                    current = sentence.to_string();
                } else {
                    current = candidate;
                }
                continue;
            }

            if !current.trim().is_empty() {
                let reason = if current_length >= self.options.min_length {
                    BreakReason::SentenceBoundary
                } else {
                    BreakReason::Forced
                };
                segments.push(Segment::new(&current, order, reason));
                order += 1;
                current.clear();
            }

            if measured_length(sentence) <= self.options.max_length {
                current = sentence.to_string();
            } else {
                // Never truncate mid-sentence: an oversized sentence goes
                // out whole, tagged so the balancer leaves it alone.
                segments.push(Segment::new(sentence, order, BreakReason::LongSentence));
                order += 1;
            }
        }

        if !current.trim().is_empty() {
            let current_length = measured_length(&current);
            if current_length >= self.options.min_length || allow_flexible_final {
                let reason = if allow_flexible_final {
                    BreakReason::FinalSegment
                } else {
                    BreakReason::SentenceBoundary
                };
                segments.push(Segment::new(&current, order, reason));
            } else if !segments.is_empty() {
                // Interior tail below the minimum: fold it into the previous
                // segment when the result still fits.
                if let Some(last) = segments.last_mut() {
                    let merged = format!("{} {}", last.content, current).trim().to_string();
                    if measured_length(&merged) <= self.options.max_length {
                        last.length = smart_length(&merged);
                        last.content = merged;
                        last.metadata.merged = true;
                    } else {
                        segments.push(Segment::new(&current, order, BreakReason::Forced));
                    }
                }
            } else {
                segments.push(Segment::new(&current, order, BreakReason::Forced));
            }
        }

        segments
    }

    /// Normalize a segment list: merge undersized segments forward,
    /// re-split anything over the maximum, and renumber.
    fn balance_segments(&self, segments: Vec<Segment>) -> Vec<Segment> {
        if segments.len() <= 1 {
            return renumber(segments);
        }

        let mut balanced: Vec<Segment> = Vec::new();
        let mut index = 0;

        while index < segments.len() {
            let current = &segments[index];
            let current_length = measured_length(&current.content);

            if current_length >= self.options.min_length
                && current_length <= self.options.max_length
            {
                balanced.push(current.clone());
                index += 1;
                continue;
            }

            if current.length < self.options.min_length && index < segments.len() - 1 {
                let mut consumed = 1;
                let mut combined = current.content.clone();
                let mut combined_length = measured_length(&combined);
                let mut last_consumed = index;

                while combined_length < self.options.min_length
                    && index + consumed < segments.len()
                {
                    let next = &segments[index + consumed];
                    combined = format!("{} {}", combined, next.content).trim().to_string();
                    combined_length = measured_length(&combined);
                    last_consumed = index + consumed;
                    consumed += 1;

                    if last_consumed == segments.len() - 1 {
                        break;
                    }
                }

                let reached_end = last_consumed == segments.len() - 1;

                if consumed > 1 {
                    if combined_length <= self.options.max_length && !reached_end {
                        let mut merged =
                            Segment::new(&combined, current.order, BreakReason::MergedForBalance);
                        merged.metadata.merged = true;
                        balanced.push(merged);
                        index += consumed;
                        continue;
                    }

                    // The merge itself overflowed (or swallowed the tail):
                    // rebuild it at sentence granularity.
                    let resplit =
                        self.accumulate_sentences(&combined, current.order, reached_end);
                    if !resplit.is_empty() {
                        balanced.extend(resplit);
                        index += consumed;
                        continue;
                    }
                }
            }

            if current_length > self.options.max_length
                && current.metadata.break_reason != BreakReason::LongSentence
            {
                balanced.extend(self.hard_split(&current.content, current.order));
                index += 1;
                continue;
            }

            balanced.push(current.clone());
            index += 1;
        }

        renumber(balanced)
    }

    /// Cut text that exceeds the maximum at fixed positions, preferring the
    /// nearest punctuation before each cut point.
    fn hard_split(&self, text: &str, start_order: usize) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut position = 0;
        let step = self.options.max_length.max(1);

        while position < chars.len() {
            let mut end = (position + step).min(chars.len());

            if self.options.prefer_sentence_boundary && end < chars.len() {
                let floor = position + self.options.min_length;
                let mut probe = end;
                while probe > floor {
                    if probe < chars.len() && is_break_punctuation(chars[probe]) {
                        end = probe + 1;
                        break;
                    }
                    probe -= 1;
                }
            }

            let piece: String = chars[position..end].iter().collect();
            segments.push(Segment::new(
                &piece,
                start_order + segments.len(),
                BreakReason::Forced,
            ));
            position = end;
        }

        segments
    }
}

/// Punctuation a hard split may cut after.
fn is_break_punctuation(c: char) -> bool {
    matches!(
        c,
        '，' | '。' | '！' | '？' | '；' | '：' | ',' | '.' | '!' | '?' | ';' | ':'
    )
}

fn renumber(mut segments: Vec<Segment>) -> Vec<Segment> {
    for (index, segment) in segments.iter_mut().enumerate() {
        segment.order = index;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn splitter(target: usize, max: usize, min: usize) -> SmartSplitter {
        SmartSplitter::new(SplitOptions {
            target_length: target,
            max_length: max,
            min_length: min,
            tolerance: 10,
            ..SplitOptions::default()
        })
        .expect("bounds are consistent")
    }

    fn strip_whitespace(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_rejects_target_above_max() {
        let result = SmartSplitter::new(SplitOptions {
            target_length: 100,
            max_length: 50,
            ..SplitOptions::default()
        });
        assert_eq!(
            result.err(),
            Some(ConfigError::TargetAboveMax {
                target: 100,
                max: 50
            })
        );
    }

    #[test]
    fn test_rejects_min_above_target() {
        let result = SmartSplitter::new(SplitOptions {
            target_length: 100,
            max_length: 200,
            min_length: 150,
            ..SplitOptions::default()
        });
        assert!(matches!(result, Err(ConfigError::MinAboveTarget { .. })));
    }

    #[test]
    fn test_empty_input_returns_no_segments() {
        let splitter = SmartSplitter::default();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\t   ").is_empty());
    }

    #[test]
    fn test_short_text_is_one_segment() {
        let splitter = SmartSplitter::default();
        let segments = splitter.split("这是一个短文本，不需要分段。");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "这是一个短文本，不需要分段。");
        assert_eq!(segments[0].order, 0);
    }

    #[test]
    fn test_segments_end_on_terminators() {
        let text = "第一句。第二句！第三句？第四句；第五句：”";
        let segments = splitter(30, 50, 10).split(text);
        assert!(!segments.is_empty());
        for segment in &segments[..segments.len() - 1] {
            let last = segment
                .content
                .chars()
                .next_back()
                .expect("segment is non-empty");
            assert!(
                ['。', '！', '？', '；', '：'].contains(&last),
                "segment {:?} does not end on a terminator",
                segment.content
            );
        }
    }

    #[test]
    fn test_optimal_partition_respects_bounds() {
        let text = "这是第三句话。".repeat(100);
        let segments = splitter(30, 50, 10).split(text.as_str());
        assert!(segments.len() > 1);
        for segment in &segments[..segments.len() - 1] {
            let length = segment.length;
            assert!(
                (10..=50).contains(&length),
                "segment length {length} out of bounds"
            );
            assert_eq!(segment.metadata.break_reason, BreakReason::DpOptimized);
        }
        let last = segments.last().expect("non-empty");
        assert_eq!(last.metadata.break_reason, BreakReason::FinalSegment);
    }

    #[test]
    fn test_oversized_unterminated_text_stays_whole() {
        let text = "永".repeat(2000);
        let segments = splitter(400, 500, 100).split(&text);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].metadata.break_reason, BreakReason::LongSentence);
        assert_eq!(strip_whitespace(&segments[0].content), text);
    }

    #[test]
    fn test_long_sentence_among_normal_ones_is_not_truncated() {
        let long = "长".repeat(80);
        let text = format!("开头的句子在这里。{long}。结尾的句子在这里。");
        let segments = splitter(20, 30, 5).split(&text);
        let oversized: Vec<_> = segments
            .iter()
            .filter(|s| s.metadata.break_reason == BreakReason::LongSentence)
            .collect();
        assert_eq!(oversized.len(), 1);
        assert!(oversized[0].content.contains(&long));
        let joined: String = segments.iter().map(|s| strip_whitespace(&s.content)).collect();
        assert_eq!(joined, strip_whitespace(&text));
    }

    #[test]
    fn test_fallback_covers_paragraph_input() {
        // Paragraph text without terminators forces the fallback path.
        let paragraph = "没有结束标点的行 ".repeat(12);
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let segments = splitter(30, 40, 10).split(&text);
        assert!(!segments.is_empty());
        let joined: String = segments.iter().map(|s| strip_whitespace(&s.content)).collect();
        assert_eq!(joined, strip_whitespace(&text));
    }

    #[test]
    fn test_orders_are_sequential() {
        let text = "句子内容很普通。".repeat(60);
        let segments = splitter(25, 40, 10).split(text.as_str());
        for (index, segment) in segments.iter().enumerate() {
            assert_eq!(segment.order, index);
        }
    }

    #[test]
    fn test_balancing_is_idempotent() {
        let splitter = splitter(25, 40, 10);
        let text = "这里是一些内容。".repeat(40);
        let segments = splitter.split(text.as_str());
        let rebalanced = splitter.balance_segments(segments.clone());
        assert_eq!(segments, rebalanced);
    }

    #[test]
    fn test_flush_at_max_grows_segments() {
        // The oversized lead sentence rules out an optimal partition, so
        // the greedy accumulator handles the short sentences that follow.
        let text = format!("{}。{}", "超".repeat(30), "一二三。".repeat(40));
        let base = SplitOptions {
            target_length: 10,
            max_length: 20,
            min_length: 2,
            ..SplitOptions::default()
        };
        let at_target = SmartSplitter::new(base.clone()).expect("bounds are consistent");
        let at_max = SmartSplitter::new(SplitOptions {
            flush_policy: FlushPolicy::AtMax,
            ..base
        })
        .expect("bounds are consistent");

        let eager = at_target.split(&text);
        let lazy = at_max.split(&text);
        assert!(lazy.len() < eager.len());
    }

    #[test]
    fn test_hard_split_prefers_punctuation() {
        let splitter = splitter(10, 20, 4);
        let text = format!("{}，{}", "甲".repeat(15), "乙".repeat(30));
        let segments = splitter.hard_split(&text, 0);
        assert!(segments.len() > 1);
        assert!(segments[0].content.ends_with('，'));
        for segment in &segments {
            assert_eq!(segment.metadata.break_reason, BreakReason::Forced);
        }
    }

    #[test]
    fn test_segment_text_convenience() {
        let segments = segment_text("你好。", SplitOptions::default()).expect("valid options");
        assert_eq!(segments.len(), 1);
        assert!(segment_text(
            "你好。",
            SplitOptions {
                target_length: 10,
                max_length: 5,
                ..SplitOptions::default()
            }
        )
        .is_err());
    }

    proptest! {
        #[test]
        fn prop_split_preserves_text(text in "[\u{4e00}-\u{4e7f}a-z 。！？，\n]{0,400}") {
            let splitter = splitter(20, 30, 8);
            let segments = splitter.split(&text);
            let joined: String = segments.iter().map(|s| strip_whitespace(&s.content)).collect();
            prop_assert_eq!(joined, strip_whitespace(&normalize_text(&text)));
        }

        #[test]
        fn prop_orders_are_gapless(text in "[\u{4e00}-\u{4e7f}。；！]{0,300}") {
            let splitter = splitter(15, 25, 5);
            let segments = splitter.split(&text);
            for (index, segment) in segments.iter().enumerate() {
                prop_assert_eq!(segment.order, index);
            }
        }
    }
}
