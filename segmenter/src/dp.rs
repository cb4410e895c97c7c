//! Optimal sentence-level partitioning.
//!
//! Finds a partition of the sentence list into contiguous groups where
//! every group fits within the maximum length and every group except the
//! terminal one also meets the minimum. Greedy accumulation can paint
//! itself into a corner (a valid-looking prefix that leaves an unsplittable
//! tail); the table search below explores all valid prefixes, so it
//! produces a partition whenever one exists.

use log::warn;

use crate::length::measured_length;
use crate::sentence::SentenceSpan;
use crate::splitter::SplitOptions;

/// Sentence-index range of one planned segment, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentPlan {
    pub start: usize,
    pub end: usize,
}

/// Inputs beyond this many sentences skip the table search entirely and
/// take the greedy path, bounding worst-case latency.
const MAX_PLANNED_SENTENCES: usize = 4096;

/// Compute an optimal partition of `sentences`, or `None` when no valid
/// partition exists.
///
/// The table is filled from the last sentence backwards: `cut[i]` holds the
/// end index of the first group of a solvable partition of `sentences[i..]`.
/// For each start the shortest valid group whose remainder is solvable is
/// taken, biasing toward earlier cuts and shorter segments. Group text is
/// sliced from `text` via the span offsets, so lengths include the
/// whitespace joining the sentences.
pub(crate) fn plan_segments(
    text: &str,
    sentences: &[SentenceSpan],
    options: &SplitOptions,
) -> Option<Vec<SegmentPlan>> {
    let count = sentences.len();
    if count == 0 {
        return None;
    }
    if count > MAX_PLANNED_SENTENCES {
        warn!(
            "skipping optimal partition for {} sentences (limit {})",
            count, MAX_PLANNED_SENTENCES
        );
        return None;
    }

    let mut cut: Vec<Option<usize>> = vec![None; count];

    for start in (0..count).rev() {
        for end in start..count {
            let group = &text[sentences[start].start..sentences[end].end];
            let length = measured_length(group);

            // Extending the group only grows it; once over the cap there is
            // nothing further to try from this start.
            if length > options.max_length {
                break;
            }

            let is_terminal = end == count - 1;
            let min_required = if is_terminal { 0 } else { options.min_length };
            if length < min_required {
                continue;
            }

            let remainder_solvable = is_terminal || cut[end + 1].is_some();
            if remainder_solvable {
                cut[start] = Some(end);
                break;
            }
        }
    }

    let mut plans = Vec::new();
    let mut index = 0;
    while index < count {
        let end = cut[index]?;
        plans.push(SegmentPlan { start: index, end });
        index = end + 1;
    }
    Some(plans)
}
