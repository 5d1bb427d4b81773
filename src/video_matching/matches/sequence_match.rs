use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A run of consecutive frames that appear, in the same order, in both sequences.
///
/// Frames `original_start..original_start + len` of the original line up one-to-one with
/// frames `suspect_start..suspect_start + len` of the suspect.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct SequenceMatch {
    pub original_start: usize,
    pub suspect_start: usize,
    pub len: usize,
    /// Mean similarity over the run.
    pub confidence: f64,
}

impl SequenceMatch {
    #[must_use]
    pub const fn new(original_start: usize, suspect_start: usize, len: usize, confidence: f64) -> Self {
        Self {
            original_start,
            suspect_start,
            len,
            confidence,
        }
    }

    /// Indices of the matched frames in the original sequence.
    #[must_use]
    pub const fn original_range(&self) -> Range<usize> {
        self.original_start..self.original_start + self.len
    }

    /// Indices of the matched frames in the suspect sequence.
    #[must_use]
    pub const fn suspect_range(&self) -> Range<usize> {
        self.suspect_start..self.suspect_start + self.len
    }

    /// True if the two matches share a frame of either sequence.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        const fn intersects(a: &Range<usize>, b: &Range<usize>) -> bool {
            a.start < b.end && b.start < a.end
        }

        intersects(&self.original_range(), &other.original_range())
            || intersects(&self.suspect_range(), &other.suspect_range())
    }
}
