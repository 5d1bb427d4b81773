#![allow(clippy::let_and_return)]
#![allow(clippy::len_without_is_empty)]
#![warn(clippy::cast_lossless)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::todo)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::unimplemented)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::panic)]
#![allow(clippy::doc_markdown)]

//! # Overview
//! `vid_overlap_lib` decides how likely it is that a suspect video (or image) reuses content
//! from an original. It works on fingerprints that an upstream extractor has already produced
//! for each sampled frame: a perceptual hash, a DCT hash, a neural embedding and a handful of
//! visual statistics. Any of these may be missing.
//!
//! # How it works
//! 1. Every original frame is compared with every suspect frame. The available signals are
//!    fused into one similarity, with the weights of missing signals shared out among the rest.
//! 2. The resulting similarity matrix is scored three ways:
//!    * visual similarity: how closely each original frame is matched by some suspect frame;
//!    * temporal alignment: a dynamic-programming alignment that rewards matched frames
//!      appearing in the same order;
//!    * sequence matches: runs of consecutive frames shared by both sequences.
//! 3. The three are combined into an overall confidence.
//!
//! Comparisons never fail. Missing signals lower the scores, and empty or very short inputs
//! produce zero scores and no matches.
//!
//! ```rust
//! use vid_overlap_lib::{compare_sequences, CompareOptions, FingerprintSequence, FrameFingerprint, FrameHash};
//!
//! let frame = |ts: f64, hash: u64| {
//!     FrameFingerprint::new(ts)
//!         .unwrap()
//!         .with_perceptual_hash(FrameHash::from_u64(hash))
//! };
//! let original: FingerprintSequence = (0..5u32).map(|i| frame(f64::from(i), 0x1111 * u64::from(i + 1))).collect();
//!
//! let res = compare_sequences(&original, &original, &CompareOptions::default());
//! assert!(res.overall_confidence > 0.99);
//! assert_eq!(res.matches.len(), 1);
//! ```
//!
//! # Limitations
//! Alignment and match detection are quadratic (and worse) in the number of frames, so longer
//! sequences are sampled down to [`CompareOptions::max_frames_per_sequence`] evenly spaced
//! frames before comparison.

#[macro_use]
extern crate log;

mod definitions;
mod video_matching;

pub use video_matching::{
    certificate::FingerprintCertificate,
    confidence::{aggregate, overall_confidence},
    frame_fingerprint::{FingerprintSequence, FrameFingerprint},
    frame_hash::FrameHash,
    matches::{match_detector::find_matches, sequence_match::SequenceMatch},
    pairwise_similarity::{FusionWeights, PairwiseSimilarity, SignalKind, SignalScores},
    similarity_matrix::{FrameMatch, SimilarityMatrix},
    similarity_result::{AnalysisMetadata, SimilarityResult},
    temporal_aligner::temporal_alignment,
    video_comparison::{compare_frames, compare_sequences, CompareOptions},
    visual_stats::VisualStats,
    Error,
};

pub use definitions::{
    ALGORITHM_VERSION, CANONICAL_HASH_BITS, CERTIFICATE_MATCH_THRESHOLD,
    DEFAULT_FRAME_MATCH_THRESHOLD, DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_FRAMES_PER_SEQUENCE,
    DEFAULT_MAX_MATCHES, DEFAULT_MIN_SEQUENCE_LENGTH, MIN_ALIGNMENT_FRAMES,
};

#[cfg(any(feature = "test-util", test))]
#[doc(hidden)]
pub mod test_util {
    pub use crate::video_matching::frame_fingerprint::test_util::TEST_EMBEDDING_LEN;
}
