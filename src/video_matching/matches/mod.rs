pub mod match_detector;
pub mod sequence_match;
