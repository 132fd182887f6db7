//! Size-bounded coalescing of segments into storage-ready chunks.

use super::{Chunk, ChunkMetadata, Segment, TopicFlags};
use uuid::Uuid;

/// Default character budget per chunk.
pub const DEFAULT_MAX_CHARS: usize = 1500;

/// Accumulates rendered segments until the character budget is reached.
///
/// The running size is the sum of rendered line lengths in characters. Newline
/// separators are not counted, so a full chunk may exceed the budget by up to
/// one character per line break.
#[derive(Debug)]
pub struct SegmentChunker {
    max_chars: usize,
    lines: Vec<String>,
    segments: Vec<Segment>,
    size: usize,
    chunks: Vec<Chunk>,
}

impl SegmentChunker {
    /// Create a chunker with the given character budget.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            lines: Vec::new(),
            segments: Vec::new(),
            size: 0,
            chunks: Vec::new(),
        }
    }

    /// Add the next segment, flushing the buffer first if it would overflow.
    pub fn push(&mut self, segment: &Segment) {
        let line = segment.render();
        let len = line.chars().count();

        if self.size > 0 && self.size + len > self.max_chars {
            self.flush();
        }

        self.lines.push(line);
        self.segments.push(segment.clone());
        self.size += len;
    }

    /// Emit the buffered segments as one chunk. No-op when the buffer is empty.
    pub fn flush(&mut self) {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return;
        };

        let flags = self
            .segments
            .iter()
            .fold(TopicFlags::default(), |acc, s| acc.union(s.flags));

        let metadata = ChunkMetadata {
            call_id: first.call_id.clone(),
            start_ts: first.timestamp.clone(),
            end_ts: last.timestamp.clone(),
            seg_start_idx: first.idx,
            seg_end_idx: last.idx,
            mentions_pricing: flags.mentions_pricing,
            mentions_security: flags.mentions_security,
            mentions_competitor: flags.mentions_competitor,
        };

        self.chunks.push(Chunk {
            id: Uuid::new_v4(),
            text: self.lines.join("\n"),
            metadata,
        });

        self.lines.clear();
        self.segments.clear();
        self.size = 0;
    }

    /// Flush any remaining segments and return all chunks in order.
    pub fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Coalesce consecutive segments into chunks of at most `max_chars` characters.
///
/// A segment is never split: one whose rendered line alone exceeds the budget
/// becomes its own oversized chunk.
pub fn chunk_segments(segments: &[Segment], max_chars: usize) -> Vec<Chunk> {
    let mut chunker = SegmentChunker::new(max_chars);
    for segment in segments {
        chunker.push(segment);
    }
    chunker.finish()
}
