/// Version tag written into every report and certificate.
pub const ALGORITHM_VERSION: &str = "copyright-shield-v1";

/// Length of the perceptual and DCT hashes produced by the extractor. Hex text shorter than
/// this (leading zero nibbles stripped) is zero-filled up to this many bits.
pub const CANONICAL_HASH_BITS: usize = 64;

/// Sequences shorter than this on either side cannot claim any temporal alignment.
pub const MIN_ALIGNMENT_FRAMES: usize = 3;

/// Default length of the window used to seed a sequence match.
pub const DEFAULT_MIN_SEQUENCE_LENGTH: usize = 3;

/// Default mean similarity a window must reach to seed a sequence match, and the similarity
/// every frame must keep while a match is extended.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

/// Stricter match threshold used when comparing for certificate generation.
pub const CERTIFICATE_MATCH_THRESHOLD: f64 = 0.8;

/// Default number of sequence matches kept in a report.
pub const DEFAULT_MAX_MATCHES: usize = 10;

/// Default cap on the frames of each sequence. Alignment and match detection are O(N*M) (and
/// worse), so inputs longer than this are sampled down.
pub const DEFAULT_MAX_FRAMES_PER_SEQUENCE: usize = 100;

/// Default similarity an original frame's best suspect frame must exceed to be listed as a
/// frame match.
pub const DEFAULT_FRAME_MATCH_THRESHOLD: f64 = 0.3;

// Fusion weights, used as-is when all four signals are present.
pub const PERCEPTUAL_HASH_WEIGHT: f64 = 0.35;
pub const DCT_HASH_WEIGHT: f64 = 0.25;
pub const EMBEDDING_WEIGHT: f64 = 0.25;
pub const VISUAL_STATS_WEIGHT: f64 = 0.15;

//guards the relative difference of two visual statistics against division by zero.
pub const VISUAL_STATS_EPSILON: f64 = 1e-9;

// Temporal alignment: a skipped frame on either side scores at this fraction of a true match.
pub const ALIGNMENT_SKIP_WEIGHT: f64 = 0.5;

// Confidence aggregation.
pub const VISUAL_SIMILARITY_COEFF: f64 = 0.70;
pub const TEMPORAL_ALIGNMENT_COEFF: f64 = 0.20;
pub const BEST_MATCH_COEFF: f64 = 0.10;
pub const NO_MATCHES_PENALTY: f64 = 0.8;
pub const WEAK_ALIGNMENT_PENALTY: f64 = 0.9;
pub const WEAK_ALIGNMENT_LIMIT: f64 = 0.3;

//reported scores are rounded to this many decimal places.
pub const SCORE_DECIMALS: i32 = 4;
