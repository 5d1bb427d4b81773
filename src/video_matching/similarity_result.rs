use serde::{Deserialize, Serialize};

use super::{matches::sequence_match::SequenceMatch, similarity_matrix::FrameMatch};

/// The outcome of comparing a suspect sequence against an original.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Mean over the original frames of their best similarity to any suspect frame.
    pub visual_similarity: f64,
    /// How well the two sequences line up in time.
    pub temporal_alignment: f64,
    pub overall_confidence: f64,
    /// Non-overlapping shared runs, highest confidence first.
    pub matches: Vec<SequenceMatch>,
    /// The best suspect frame for each original frame that has a plausible match.
    pub frame_matches: Vec<FrameMatch>,
    pub metadata: AnalysisMetadata,
}

/// What was compared, and with which settings.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub algorithm_version: String,
    /// Frames supplied by the caller.
    pub frame_count_original: usize,
    pub frame_count_suspect: usize,
    /// Frames left after sampling down to `max_frames_per_sequence`.
    pub frames_analyzed_original: usize,
    pub frames_analyzed_suspect: usize,
    pub min_sequence_length: usize,
    pub match_threshold: f64,
    pub max_matches: usize,
    pub max_frames_per_sequence: usize,
    pub frame_match_threshold: f64,
    pub total_frame_matches: usize,
    /// Mean absolute difference in seconds between the timestamps of each frame match.
    pub mean_timestamp_offset: Option<f64>,
    pub elapsed_ms: u64,
}

impl SimilarityResult {
    /// The best sequence match, if any.
    #[must_use]
    pub fn best_match(&self) -> Option<&SequenceMatch> {
        self.matches.first()
    }

    /// Number of original frames covered by a sequence match.
    #[must_use]
    pub fn matched_original_frames(&self) -> usize {
        self.matches.iter().map(|m| m.len).sum()
    }
}
