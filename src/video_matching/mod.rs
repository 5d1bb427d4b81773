pub mod certificate;
pub mod confidence;
pub mod frame_fingerprint;
pub mod frame_hash;
pub mod matches;
pub mod pairwise_similarity;
pub mod similarity_matrix;
pub mod similarity_result;
pub mod temporal_aligner;
pub mod video_comparison;
pub mod visual_stats;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error that prevented a fingerprint from being built from extractor output.
///
/// Comparisons themselves never fail: missing or mismatched signals only lower the scores.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// Hash text is not hexadecimal.
    #[error("Invalid hash: {0:?}")]
    InvalidHash(String),

    /// Timestamps must be finite and non-negative.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    #[error("Embedding contains a non-finite value")]
    InvalidEmbedding,

    /// Visual statistics must be finite and non-negative.
    #[error("Invalid visual statistic {name}: {value}")]
    InvalidVisualStat { name: String, value: f64 },
}
