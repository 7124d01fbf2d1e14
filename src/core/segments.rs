//! Discovery of buffer-padded annotated intervals.

use serde::Serialize;

use super::index::AnnotationIndex;

pub const DEFAULT_BUFFER_FRAMES: usize = 10;

/// Inclusive, 0-based frame range exported as one clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub id: usize,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    /// Number of frames in the range.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// What to do with padded segments that overlap or touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentPolicy {
    /// Emit every discovered interval as-is, even if neighbors overlap.
    #[default]
    Separate,
    /// Coalesce overlapping or adjacent intervals.
    Merge,
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentFinder {
    pub buffer_frames: usize,
    pub policy: SegmentPolicy,
}

impl Default for SegmentFinder {
    fn default() -> Self {
        Self {
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            policy: SegmentPolicy::Separate,
        }
    }
}

impl SegmentFinder {
    pub fn new(buffer_frames: usize, policy: SegmentPolicy) -> Self {
        Self {
            buffer_frames,
            policy,
        }
    }

    /// Single scan over `0..frame_count`.
    ///
    /// A run of annotated frames `[a, b]` becomes
    /// `[max(0, a - buffer), min(frame_count - 1, b + buffer)]`.
    pub fn find(&self, index: &AnnotationIndex<'_>, frame_count: usize) -> Vec<Segment> {
        let mut segments = Vec::new();
        // (start, last annotated frame) of the open run
        let mut open: Option<(usize, usize)> = None;

        for frame in 0..frame_count {
            match (index.is_annotated(frame), open) {
                (true, None) => open = Some((frame.saturating_sub(self.buffer_frames), frame)),
                (true, Some((start, _))) => open = Some((start, frame)),
                (false, Some((start, last))) => {
                    segments.push(self.close(segments.len(), start, last, frame_count));
                    open = None;
                }
                (false, None) => {}
            }
        }
        if let Some((start, last)) = open {
            segments.push(self.close(segments.len(), start, last, frame_count));
        }

        match self.policy {
            SegmentPolicy::Separate => segments,
            SegmentPolicy::Merge => merge(segments),
        }
    }

    fn close(&self, id: usize, start: usize, last: usize, frame_count: usize) -> Segment {
        Segment {
            id,
            start,
            end: last.saturating_add(self.buffer_frames).min(frame_count - 1),
        }
    }
}

/// Coalesce ordered segments whose ranges overlap or touch, renumbering ids.
pub fn merge(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        if let Some(prev) = merged.last_mut() {
            if seg.start <= prev.end + 1 {
                prev.end = prev.end.max(seg.end);
                continue;
            }
        }
        let id = merged.len();
        merged.push(Segment { id, ..seg });
    }
    merged
}
