use ndarray::prelude::*;
#[cfg(feature = "parallel")]
use ndarray::Zip;
use serde::{Deserialize, Serialize};

use super::{frame_fingerprint::FrameFingerprint, pairwise_similarity::PairwiseSimilarity};

/// Dense table of pairwise similarities between an original sequence (rows) and a suspect
/// sequence (columns). Built once per comparison and shared by every later stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix(Array2<f64>);

/// The best suspect frame for one original frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMatch {
    pub original_frame: usize,
    pub suspect_frame: usize,
    pub similarity: f64,
    pub original_timestamp: f64,
    pub suspect_timestamp: f64,
}

impl SimilarityMatrix {
    /// Compare every original frame against every suspect frame.
    pub fn build<A, B>(original: &[A], suspect: &[B], similarity: &PairwiseSimilarity) -> Self
    where
        A: AsRef<FrameFingerprint> + Sync,
        B: AsRef<FrameFingerprint> + Sync,
    {
        let mut cells = Array2::<f64>::zeros((original.len(), suspect.len()));

        let fill = |(i, j): (usize, usize), cell: &mut f64| {
            *cell = similarity.similarity(original[i].as_ref(), suspect[j].as_ref());
        };

        #[cfg(feature = "parallel")]
        Zip::indexed(&mut cells).par_for_each(fill);

        #[cfg(not(feature = "parallel"))]
        cells.indexed_iter_mut().for_each(|(idx, cell)| fill(idx, cell));

        debug!(
            target: "similarity_matrix",
            "built {}x{} similarity matrix",
            original.len(),
            suspect.len()
        );

        Self(cells)
    }

    /// Wrap precomputed similarities. Values are clamped into `0.0..=1.0`.
    #[must_use]
    pub fn from_array(cells: Array2<f64>) -> Self {
        Self(cells.mapv(|x| if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }))
    }

    /// Number of original frames.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of suspect frames.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Similarity of original frame `i` and suspect frame `j`. Panics if out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[[i, j]]
    }

    #[must_use]
    pub fn as_array(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    /// The mean similarity of the `len` cells on the diagonal starting at `(i, j)`.
    pub(crate) fn diagonal_mean(&self, i: usize, j: usize, len: usize) -> f64 {
        let sum: f64 = (0..len).map(|k| self.0[[i + k, j + k]]).sum();
        sum / len as f64
    }

    /// For each original frame, the index and similarity of its most similar suspect frame.
    /// Ties go to the earliest suspect frame. Empty when there are no suspect frames.
    pub fn best_per_row(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.rows().into_iter().filter_map(|row| {
            row.iter()
                .copied()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (j, sim)| match best {
                    Some((_, best_sim)) if best_sim >= sim => best,
                    _ => Some((j, sim)),
                })
        })
    }

    /// Mean over every original frame of its best similarity against any suspect frame.
    #[must_use]
    pub fn visual_similarity(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let total: f64 = self.best_per_row().map(|(_, sim)| sim).sum();
        total / self.rows() as f64
    }

    /// Best suspect frame for each original frame whose best similarity exceeds `threshold`.
    pub fn frame_matches<A, B>(&self, original: &[A], suspect: &[B], threshold: f64) -> Vec<FrameMatch>
    where
        A: AsRef<FrameFingerprint>,
        B: AsRef<FrameFingerprint>,
    {
        self.best_per_row()
            .enumerate()
            .filter(|(_, (_, sim))| *sim > threshold)
            .map(|(i, (j, sim))| FrameMatch {
                original_frame: i,
                suspect_frame: j,
                similarity: sim,
                original_timestamp: original[i].as_ref().timestamp(),
                suspect_timestamp: suspect[j].as_ref().timestamp(),
            })
            .collect()
    }
}
