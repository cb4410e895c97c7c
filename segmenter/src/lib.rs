//! Length-bounded, sentence-aware text segmentation.
//!
//! Cuts long-form narrative text (novels, articles, dialogue transcripts)
//! into segments for downstream per-segment processing such as script
//! generation and narration. Segments respect strict effective-length
//! bounds, break at sentence boundaries wherever possible, and stay as
//! uniform as the text allows.
//!
//! Two complementary strategies are provided:
//! - [`SmartSplitter`]: strict document segmentation. An optimal
//!   sentence-level partition when one exists, with a greedy
//!   sentence-accumulation fallback and a balancing pass.
//! - [`RecursiveChunker`] / [`smart_split`]: looser separator-priority
//!   chunking with sliding-window overlap, for callers that need
//!   inter-chunk context rather than strict bounds.
//!
//! The engine is pure and synchronous: no I/O, no shared state, total over
//! any input string.

mod clean;
mod dp;

pub mod chunker;
pub mod error;
pub mod length;
pub mod segment;
pub mod sentence;
pub mod splitter;
pub mod validate;

pub use chunker::{
    Chunk, ChunkOptions, ContentType, LengthMode, RecursiveChunker, SmartChunkOptions,
    smart_split,
};
pub use error::{ConfigError, Result};
pub use length::smart_length;
pub use segment::{BreakReason, Segment, SegmentMetadata};
pub use sentence::{SentenceSpan, scan_sentences};
pub use splitter::{FlushPolicy, SmartSplitter, SplitOptions, segment_text};
pub use validate::{QualityReport, QualityStats, validate_segments};
