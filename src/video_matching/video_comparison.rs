use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{
    confidence,
    frame_fingerprint::{FingerprintSequence, FrameFingerprint},
    matches::match_detector,
    pairwise_similarity::{FusionWeights, PairwiseSimilarity},
    similarity_matrix::{FrameMatch, SimilarityMatrix},
    similarity_result::{AnalysisMetadata, SimilarityResult},
    temporal_aligner,
};
use crate::definitions::{
    ALGORITHM_VERSION, CERTIFICATE_MATCH_THRESHOLD, DEFAULT_FRAME_MATCH_THRESHOLD,
    DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_FRAMES_PER_SEQUENCE, DEFAULT_MAX_MATCHES,
    DEFAULT_MIN_SEQUENCE_LENGTH,
};

/// Settings for [`compare_sequences`].
///
/// The `with_*` setters clamp their arguments: thresholds into `0.0..=1.0`, lengths to at
/// least 1 and fusion weights by [`FusionWeights::sanitized`]. Fields set directly (or
/// deserialized) are clamped the same way when a comparison starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Frames in the window that seeds a sequence match. Sequences shorter than this cannot
    /// align.
    pub min_sequence_length: usize,
    pub match_threshold: f64,
    pub max_matches: usize,
    /// Longer sequences are sampled down to this many evenly spaced frames.
    pub max_frames_per_sequence: usize,
    /// An original frame is listed in the frame matches when its best similarity exceeds this.
    pub frame_match_threshold: f64,
    pub weights: FusionWeights,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            min_sequence_length: DEFAULT_MIN_SEQUENCE_LENGTH,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            max_matches: DEFAULT_MAX_MATCHES,
            max_frames_per_sequence: DEFAULT_MAX_FRAMES_PER_SEQUENCE,
            frame_match_threshold: DEFAULT_FRAME_MATCH_THRESHOLD,
            weights: FusionWeights::default(),
        }
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

impl CompareOptions {
    /// The stricter preset used when a comparison backs a certificate.
    #[must_use]
    pub fn certificate() -> Self {
        Self::default().with_match_threshold(CERTIFICATE_MATCH_THRESHOLD)
    }

    #[must_use]
    pub fn with_min_sequence_length(self, min_sequence_length: usize) -> Self {
        Self {
            min_sequence_length: min_sequence_length.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn with_match_threshold(self, match_threshold: f64) -> Self {
        Self {
            match_threshold: clamp_unit(match_threshold),
            ..self
        }
    }

    /// Zero is allowed, and turns off sequence match detection.
    #[must_use]
    pub fn with_max_matches(self, max_matches: usize) -> Self {
        Self { max_matches, ..self }
    }

    #[must_use]
    pub fn with_max_frames_per_sequence(self, max_frames_per_sequence: usize) -> Self {
        Self {
            max_frames_per_sequence: max_frames_per_sequence.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn with_frame_match_threshold(self, frame_match_threshold: f64) -> Self {
        Self {
            frame_match_threshold: clamp_unit(frame_match_threshold),
            ..self
        }
    }

    #[must_use]
    pub fn with_weights(self, weights: FusionWeights) -> Self {
        Self {
            weights: weights.sanitized(),
            ..self
        }
    }

    //Apply the setter clamps to fields that may have been set directly.
    fn sanitized(self) -> Self {
        self.with_min_sequence_length(self.min_sequence_length)
            .with_match_threshold(self.match_threshold)
            .with_max_frames_per_sequence(self.max_frames_per_sequence)
            .with_frame_match_threshold(self.frame_match_threshold)
            .with_weights(self.weights)
    }
}

/// Compare a suspect sequence against an original and report how much of the original it
/// reuses.
///
/// Never fails. Missing signals lower the scores, and empty or very short sequences produce a
/// result with zero scores and no matches.
#[must_use]
pub fn compare_sequences(
    original: &FingerprintSequence,
    suspect: &FingerprintSequence,
    options: &CompareOptions,
) -> SimilarityResult {
    let start = Instant::now();
    let options = options.sanitized();

    let original_frames = sample(original, options.max_frames_per_sequence, "original");
    let suspect_frames = sample(suspect, options.max_frames_per_sequence, "suspect");

    if original_frames.is_empty() || suspect_frames.is_empty() {
        warn!(
            target: "compare",
            "Nothing to compare: original has {} frames, suspect has {} frames",
            original.len(),
            suspect.len()
        );
    }

    let similarity = PairwiseSimilarity::with_weights(options.weights);
    let matrix = SimilarityMatrix::build(&original_frames, &suspect_frames, &similarity);

    let visual_similarity = matrix.visual_similarity();
    let temporal_alignment = temporal_aligner::temporal_alignment(&matrix, options.min_sequence_length);
    let matches = match_detector::find_matches(
        &matrix,
        options.min_sequence_length,
        options.match_threshold,
        options.max_matches,
    );
    let frame_matches = matrix.frame_matches(&original_frames, &suspect_frames, options.frame_match_threshold);

    let metadata = AnalysisMetadata {
        algorithm_version: ALGORITHM_VERSION.to_string(),
        frame_count_original: original.len(),
        frame_count_suspect: suspect.len(),
        frames_analyzed_original: original_frames.len(),
        frames_analyzed_suspect: suspect_frames.len(),
        min_sequence_length: options.min_sequence_length,
        match_threshold: options.match_threshold,
        max_matches: options.max_matches,
        max_frames_per_sequence: options.max_frames_per_sequence,
        frame_match_threshold: options.frame_match_threshold,
        total_frame_matches: frame_matches.len(),
        mean_timestamp_offset: mean_timestamp_offset(&frame_matches),
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    let result = confidence::aggregate(visual_similarity, temporal_alignment, matches, frame_matches, metadata);

    info!(
        target: "compare",
        "visual {:.3}, temporal {:.3}, overall {:.3}, {} sequence matches, {} frame matches",
        result.visual_similarity,
        result.temporal_alignment,
        result.overall_confidence,
        result.matches.len(),
        result.frame_matches.len()
    );

    result
}

/// Similarity in `0.0..=1.0` of two single frames or images, fused with the default weights.
#[must_use]
pub fn compare_frames(a: &FrameFingerprint, b: &FrameFingerprint) -> f64 {
    PairwiseSimilarity::default().similarity(a, b)
}

fn sample<'a>(seq: &'a FingerprintSequence, max_frames: usize, side: &str) -> Vec<&'a FrameFingerprint> {
    let frames = seq.sample_evenly(max_frames);
    if frames.len() < seq.len() {
        warn!(
            target: "compare",
            "Sampling {side} sequence down from {} to {} frames",
            seq.len(),
            frames.len()
        );
    }
    frames
}

fn mean_timestamp_offset(frame_matches: &[FrameMatch]) -> Option<f64> {
    if frame_matches.is_empty() {
        return None;
    }

    let total: f64 = frame_matches
        .iter()
        .map(|m| (m.suspect_timestamp - m.original_timestamp).abs())
        .sum();
    Some(total / frame_matches.len() as f64)
}
