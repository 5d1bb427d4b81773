use bitvec::prelude::*;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::sequence_match::SequenceMatch;
use crate::video_matching::similarity_matrix::SimilarityMatrix;

/// Find runs of frames shared by the two sequences behind `matrix`.
///
/// 1. Every diagonal window of `min_run_length` cells whose mean similarity reaches
///    `match_threshold` seeds a candidate.
/// 2. Each candidate is extended backwards and forwards along its diagonal for as long as each
///    newly included cell stays at or above `match_threshold`.
/// 3. A run's confidence is its mean similarity.
/// 4. Runs are accepted greedily in descending confidence, skipping any run that shares an
///    original frame or a suspect frame with a run already accepted.
///
/// The result is maximal for that greedy order, but not the globally optimal set of runs.
/// At most `max_matches` runs are returned, in descending confidence.
///
/// Cost is `O(rows * cols * min_run_length)` plus extension, so callers must keep both
/// sequences short.
#[must_use]
pub fn find_matches(
    matrix: &SimilarityMatrix,
    min_run_length: usize,
    match_threshold: f64,
    max_matches: usize,
) -> Vec<SequenceMatch> {
    let min_run_length = min_run_length.max(1);
    if matrix.rows() < min_run_length || matrix.cols() < min_run_length {
        return vec![];
    }

    let candidates = seed_candidates(matrix, min_run_length, match_threshold);
    debug!(
        target: "sequence_matches",
        "{} candidate runs from {}x{} matrix",
        candidates.len(),
        matrix.rows(),
        matrix.cols()
    );

    resolve_overlaps(candidates, matrix.rows(), matrix.cols(), max_matches)
}

fn seed_candidates(matrix: &SimilarityMatrix, len: usize, threshold: f64) -> Vec<SequenceMatch> {
    let last_col = matrix.cols() - len;
    let seed_row = |i: usize| {
        (0..=last_col)
            .filter(move |&j| matrix.diagonal_mean(i, j, len) >= threshold)
            .map(move |j| extend_run(matrix, i, j, len, threshold))
    };

    #[cfg(feature = "parallel")]
    let candidates = (0..=matrix.rows() - len)
        .into_par_iter()
        .flat_map_iter(seed_row)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let candidates = (0..=matrix.rows() - len).flat_map(seed_row).collect();

    candidates
}

fn extend_run(matrix: &SimilarityMatrix, i: usize, j: usize, len: usize, threshold: f64) -> SequenceMatch {
    let (mut start_i, mut start_j) = (i, j);
    while start_i > 0 && start_j > 0 && matrix.get(start_i - 1, start_j - 1) >= threshold {
        start_i -= 1;
        start_j -= 1;
    }

    let mut run_len = len + (i - start_i);
    while start_i + run_len < matrix.rows()
        && start_j + run_len < matrix.cols()
        && matrix.get(start_i + run_len, start_j + run_len) >= threshold
    {
        run_len += 1;
    }

    let confidence = matrix.diagonal_mean(start_i, start_j, run_len);
    SequenceMatch::new(start_i, start_j, run_len, confidence)
}

fn resolve_overlaps(
    mut candidates: Vec<SequenceMatch>,
    rows: usize,
    cols: usize,
    max_matches: usize,
) -> Vec<SequenceMatch> {
    //sort keys past confidence only exist to make the output deterministic.
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(b.len.cmp(&a.len))
            .then(a.original_start.cmp(&b.original_start))
            .then(a.suspect_start.cmp(&b.suspect_start))
    });
    //many seeds extend into the same run.
    candidates.dedup();

    let mut original_taken = bitvec![0; rows];
    let mut suspect_taken = bitvec![0; cols];
    let mut accepted = vec![];

    for cand in candidates {
        if accepted.len() >= max_matches {
            break;
        }

        let (orig, susp) = (cand.original_range(), cand.suspect_range());
        if original_taken[orig.clone()].any() || suspect_taken[susp.clone()].any() {
            trace!(target: "sequence_matches", "rejecting overlapping run {cand:?}");
            continue;
        }

        original_taken[orig].fill(true);
        suspect_taken[susp].fill(true);
        accepted.push(cand);
    }

    accepted
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use ndarray::Array2;
    use rand::prelude::*;

    use super::*;

    fn matrix_with(rows: usize, cols: usize, cells: &[((usize, usize), f64)]) -> SimilarityMatrix {
        let mut arr = Array2::zeros((rows, cols));
        for &((i, j), sim) in cells {
            arr[[i, j]] = sim;
        }
        SimilarityMatrix::from_array(arr)
    }

    #[test]
    fn test_too_short_for_a_run() {
        let ones = SimilarityMatrix::from_array(Array2::ones((2, 5)));
        assert!(find_matches(&ones, 3, 0.7, 10).is_empty());

        let empty = SimilarityMatrix::from_array(Array2::zeros((0, 0)));
        assert!(find_matches(&empty, 3, 0.7, 10).is_empty());
    }

    #[test]
    fn test_nothing_clears_the_threshold() {
        let low = SimilarityMatrix::from_array(Array2::from_elem((6, 6), 0.69));
        assert!(find_matches(&low, 3, 0.7, 10).is_empty());
    }

    #[test]
    fn test_identical_sequences_make_one_full_run() {
        let ones = SimilarityMatrix::from_array(Array2::ones((5, 5)));
        assert_eq!(
            find_matches(&ones, 3, 0.7, 10),
            vec![SequenceMatch::new(0, 0, 5, 1.0)]
        );
    }

    #[test]
    fn test_run_is_extended_while_frames_clear_the_threshold() {
        // diagonal: 1.0 0.5 1.0 1.0 0.2
        let m = matrix_with(
            5,
            5,
            &[((0, 0), 1.0), ((1, 1), 0.5), ((2, 2), 1.0), ((3, 3), 1.0), ((4, 4), 0.2)],
        );
        assert_eq!(
            find_matches(&m, 3, 0.7, 10),
            vec![SequenceMatch::new(0, 0, 4, 0.875)]
        );
    }

    #[test]
    fn test_disjoint_runs_are_all_kept_in_confidence_order() {
        let m = matrix_with(
            8,
            8,
            &[
                ((0, 4), 0.75),
                ((1, 5), 0.75),
                ((2, 6), 0.75),
                ((4, 0), 1.0),
                ((5, 1), 1.0),
                ((6, 2), 1.0),
            ],
        );
        assert_eq!(
            find_matches(&m, 3, 0.7, 10),
            vec![
                SequenceMatch::new(4, 0, 3, 1.0),
                SequenceMatch::new(0, 4, 3, 0.75)
            ]
        );
        assert_eq!(
            find_matches(&m, 3, 0.7, 1),
            vec![SequenceMatch::new(4, 0, 3, 1.0)]
        );
        assert!(find_matches(&m, 3, 0.7, 0).is_empty());
    }

    #[test]
    fn test_resolution_is_greedy_by_confidence_not_globally_optimal() {
        // Run A (0,0,len 4, conf 1.0) overlaps both B (0,5,len 3) on the original side and
        // C (3,0,len 3) on both sides. B and C together would cover more frames, but greedy
        // resolution keeps A because it has the highest confidence.
        let m = matrix_with(
            6,
            8,
            &[
                ((0, 0), 1.0),
                ((1, 1), 1.0),
                ((2, 2), 1.0),
                ((3, 3), 1.0),
                ((0, 5), 0.75),
                ((1, 6), 0.75),
                ((2, 7), 0.75),
                ((3, 0), 0.75),
                ((4, 1), 0.75),
                ((5, 2), 0.75),
            ],
        );
        assert_eq!(
            find_matches(&m, 3, 0.7, 10),
            vec![SequenceMatch::new(0, 0, 4, 1.0)]
        );
    }

    #[test]
    fn test_random_matrices_never_return_overlapping_runs() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let rows = rng.random_range(0..30);
            let cols = rng.random_range(0..30);
            let arr = Array2::from_shape_simple_fn((rows, cols), || rng.random_range(0.0..1.0));
            let m = SimilarityMatrix::from_array(arr);

            let threshold = 0.6;
            let matches = find_matches(&m, 3, threshold, 10);

            assert!(matches.len() <= 10);
            for (a, b) in matches.iter().tuple_combinations() {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
            for pair in matches.windows(2) {
                assert!(pair[0].confidence >= pair[1].confidence);
            }
            for found in &matches {
                assert!(found.len >= 3);
                assert!(found.confidence >= threshold - 1e-12);
                assert!(found.original_range().end <= rows);
                assert!(found.suspect_range().end <= cols);
            }
        }
    }
}
