use serde::{Deserialize, Serialize};

use super::{
    frame_fingerprint::FrameFingerprint,
    pairwise_similarity::{PairwiseSimilarity, SignalKind},
    video_comparison::compare_frames,
    visual_stats::VisualStats,
};
use crate::definitions::ALGORITHM_VERSION;

/// The content fingerprint section of an ownership certificate for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintCertificate {
    pub algorithm_version: String,
    /// Hex text, `None` when the hash could not be extracted.
    pub perceptual_hash: Option<String>,
    pub dct_hash: Option<String>,
    pub has_embedding: bool,
    pub embedding_dimension: usize,
    pub visual_stats: VisualStats,
    pub signals: Vec<SignalKind>,
    /// Similarity of the fingerprint with itself. 1.0 unless nothing could be extracted.
    pub self_consistency: f64,
}

impl FingerprintCertificate {
    #[must_use]
    pub fn from_fingerprint(fp: &FrameFingerprint) -> Self {
        let signals = PairwiseSimilarity::signals(fp, fp).present().collect::<Vec<_>>();
        let self_consistency = compare_frames(fp, fp);

        debug!(
            target: "compare",
            "certificate for fingerprint with {} signals, self consistency {self_consistency:.3}",
            signals.len()
        );

        Self {
            algorithm_version: ALGORITHM_VERSION.to_string(),
            perceptual_hash: fp.perceptual_hash().map(ToString::to_string),
            dct_hash: fp.dct_hash().map(ToString::to_string),
            has_embedding: fp.embedding().is_some(),
            embedding_dimension: fp.embedding().map_or(0, <[f32]>::len),
            visual_stats: *fp.visual_stats(),
            signals,
            self_consistency,
        }
    }
}
