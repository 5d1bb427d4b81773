use super::similarity_matrix::SimilarityMatrix;
use crate::definitions::{ALIGNMENT_SKIP_WEIGHT, MIN_ALIGNMENT_FRAMES};

/// Score in `0.0..=1.0` of how well the two sequences behind `matrix` line up in time.
///
/// Dynamic-programming alignment over the similarity matrix:
/// `dp[i][j] = max(dp[i-1][j-1] + S, dp[i-1][j] + S/2, dp[i][j-1] + S/2)`.
/// Consecutive matched frames score in full, skipping a frame on one side (framerate
/// differences, trimming) scores at half weight. The final cell is normalized by the shorter
/// sequence, so a perfect diagonal scores 1.0.
///
/// Sequences shorter than `min_frames` (and never shorter than [`MIN_ALIGNMENT_FRAMES`]) on
/// either side score 0.0.
#[must_use]
pub fn temporal_alignment(matrix: &SimilarityMatrix, min_frames: usize) -> f64 {
    let min_frames = min_frames.max(MIN_ALIGNMENT_FRAMES);
    let (rows, cols) = (matrix.rows(), matrix.cols());
    if rows < min_frames || cols < min_frames {
        debug!(
            target: "temporal_alignment",
            "{rows}x{cols} is too short to align (minimum {min_frames})"
        );
        return 0.0;
    }

    // Only the previous row of the table is needed. dp[0][*] = dp[*][0] = 0.
    let mut prev = vec![0.0f64; cols + 1];
    let mut curr = vec![0.0f64; cols + 1];
    for i in 1..=rows {
        curr[0] = 0.0;
        for j in 1..=cols {
            let sim = matrix.get(i - 1, j - 1);
            let diagonal = prev[j - 1] + sim;
            let skip_suspect = prev[j] + ALIGNMENT_SKIP_WEIGHT * sim;
            let skip_original = curr[j - 1] + ALIGNMENT_SKIP_WEIGHT * sim;
            curr[j] = diagonal.max(skip_suspect).max(skip_original);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let score = prev[cols] / rows.min(cols) as f64;
    score.clamp(0.0, 1.0)
}
