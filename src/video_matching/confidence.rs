use super::{
    matches::sequence_match::SequenceMatch,
    similarity_result::{AnalysisMetadata, SimilarityResult},
    similarity_matrix::FrameMatch,
};
use crate::definitions::{
    BEST_MATCH_COEFF, NO_MATCHES_PENALTY, SCORE_DECIMALS, TEMPORAL_ALIGNMENT_COEFF,
    VISUAL_SIMILARITY_COEFF, WEAK_ALIGNMENT_LIMIT, WEAK_ALIGNMENT_PENALTY,
};

/// Overall confidence that the suspect reuses the original's content.
///
/// `0.70 * visual + 0.20 * temporal + 0.10 * best match confidence`, then
/// * `* 0.8` when no sequence match was found, and
/// * `* 0.9` when the temporal alignment is below 0.3.
///
/// These weights and penalties are fixed business rules. The result is clamped to `0.0..=1.0`
/// and rounded to four decimal places, so perfect evidence scores exactly 1.
#[must_use]
pub fn overall_confidence(
    visual_similarity: f64,
    temporal_alignment: f64,
    matches: &[SequenceMatch],
) -> f64 {
    let best_match = matches
        .iter()
        .map(|m| m.confidence)
        .fold(0.0, f64::max);

    let mut overall = VISUAL_SIMILARITY_COEFF * visual_similarity
        + TEMPORAL_ALIGNMENT_COEFF * temporal_alignment
        + BEST_MATCH_COEFF * best_match;

    if matches.is_empty() {
        overall *= NO_MATCHES_PENALTY;
    }
    if temporal_alignment < WEAK_ALIGNMENT_LIMIT {
        overall *= WEAK_ALIGNMENT_PENALTY;
    }

    report_score(overall)
}

/// Clamp a score into `0.0..=1.0` and round it for reporting. NaN becomes 0.
fn report_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    let scale = 10f64.powi(SCORE_DECIMALS);
    (score.clamp(0.0, 1.0) * scale).round() / scale
}

/// Combine the outputs of every stage into the final report.
#[must_use]
pub fn aggregate(
    visual_similarity: f64,
    temporal_alignment: f64,
    matches: Vec<SequenceMatch>,
    frame_matches: Vec<FrameMatch>,
    metadata: AnalysisMetadata,
) -> SimilarityResult {
    let overall = overall_confidence(visual_similarity, temporal_alignment, &matches);

    SimilarityResult {
        visual_similarity: report_score(visual_similarity),
        temporal_alignment: report_score(temporal_alignment),
        overall_confidence: overall,
        matches,
        frame_matches,
        metadata,
    }
}
