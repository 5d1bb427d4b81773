use serde::{Deserialize, Serialize};

use super::{
    frame_hash::{deserialize_optional, FrameHash},
    visual_stats::VisualStats,
};
use crate::Error;

/// Everything the fingerprint extractor produced for a single frame (or still image).
///
/// Every signal is optional. Extraction failures leave a signal absent, and an absent signal is
/// excluded from comparisons rather than counted as a mismatch.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawFrameFingerprint")]
pub struct FrameFingerprint {
    timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    perceptual_hash: Option<FrameHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dct_hash: Option<FrameHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "VisualStats::is_empty")]
    visual_stats: VisualStats,
}

// Extractor output as it arrives on the wire, before validation.
#[derive(Deserialize)]
struct RawFrameFingerprint {
    #[serde(default)]
    timestamp: f64,
    #[serde(default, deserialize_with = "deserialize_optional", alias = "phash", alias = "perceptualHash")]
    perceptual_hash: Option<FrameHash>,
    #[serde(default, deserialize_with = "deserialize_optional", alias = "dctHash")]
    dct_hash: Option<FrameHash>,
    #[serde(default, alias = "tf_embedding")]
    embedding: Option<Vec<f32>>,
    #[serde(default, alias = "advanced_features", alias = "visualStats")]
    visual_stats: VisualStats,
}

impl TryFrom<RawFrameFingerprint> for FrameFingerprint {
    type Error = Error;

    fn try_from(raw: RawFrameFingerprint) -> Result<Self, Self::Error> {
        let mut ret = Self::new(raw.timestamp)?
            .with_perceptual_hash(raw.perceptual_hash)
            .with_dct_hash(raw.dct_hash)
            .with_visual_stats(raw.visual_stats)?;
        if let Some(embedding) = raw.embedding {
            ret = ret.with_embedding(embedding)?;
        }
        Ok(ret)
    }
}

impl FrameFingerprint {
    /// A fingerprint with no signals, taken `timestamp` seconds into the content.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTimestamp`] if the timestamp is negative or not finite.
    pub fn new(timestamp: f64) -> Result<Self, Error> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(Error::InvalidTimestamp(timestamp));
        }

        Ok(Self {
            timestamp,
            perceptual_hash: None,
            dct_hash: None,
            embedding: None,
            visual_stats: VisualStats::default(),
        })
    }

    #[must_use]
    pub fn with_perceptual_hash(mut self, hash: impl Into<Option<FrameHash>>) -> Self {
        self.perceptual_hash = hash.into();
        self
    }

    #[must_use]
    pub fn with_dct_hash(mut self, hash: impl Into<Option<FrameHash>>) -> Self {
        self.dct_hash = hash.into();
        self
    }

    /// Attach an embedding vector. An empty vector counts as no embedding.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEmbedding`] if any component is NaN or infinite.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Result<Self, Error> {
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidEmbedding);
        }
        self.embedding = (!embedding.is_empty()).then_some(embedding);
        Ok(self)
    }

    /// # Errors
    /// Returns [`Error::InvalidVisualStat`] if a statistic is negative or not finite.
    pub fn with_visual_stats(mut self, visual_stats: VisualStats) -> Result<Self, Error> {
        visual_stats.validate()?;
        self.visual_stats = visual_stats;
        Ok(self)
    }

    /// Seconds from the start of the content.
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        self.timestamp
    }

    #[must_use]
    pub const fn perceptual_hash(&self) -> Option<&FrameHash> {
        self.perceptual_hash.as_ref()
    }

    #[must_use]
    pub const fn dct_hash(&self) -> Option<&FrameHash> {
        self.dct_hash.as_ref()
    }

    #[must_use]
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    #[must_use]
    pub const fn visual_stats(&self) -> &VisualStats {
        &self.visual_stats
    }

    /// True if at least one signal was extracted.
    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.perceptual_hash.is_some()
            || self.dct_hash.is_some()
            || self.embedding.is_some()
            || !self.visual_stats.is_empty()
    }
}

impl AsRef<Self> for FrameFingerprint {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// The fingerprints of one piece of content, in ascending timestamp order.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FrameFingerprint>", into = "Vec<FrameFingerprint>")]
pub struct FingerprintSequence {
    frames: Vec<FrameFingerprint>,
}

impl FingerprintSequence {
    /// Collect frames into a sequence, sorting them by timestamp. Frames sharing a timestamp
    /// keep their relative order.
    pub fn new(frames: impl IntoIterator<Item = FrameFingerprint>) -> Self {
        let mut frames = frames.into_iter().collect::<Vec<_>>();
        frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[FrameFingerprint] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// At most `max_frames` evenly spaced frames, in order. The stride is `len / max_frames`
    /// and the first `max_frames` strided frames are taken.
    #[must_use]
    pub fn sample_evenly(&self, max_frames: usize) -> Vec<&FrameFingerprint> {
        if self.frames.len() <= max_frames {
            return self.frames.iter().collect();
        }

        let stride = self.frames.len() / max_frames.max(1);
        self.frames
            .iter()
            .step_by(stride)
            .take(max_frames)
            .collect()
    }
}

impl From<Vec<FrameFingerprint>> for FingerprintSequence {
    fn from(frames: Vec<FrameFingerprint>) -> Self {
        Self::new(frames)
    }
}

impl From<FingerprintSequence> for Vec<FrameFingerprint> {
    fn from(seq: FingerprintSequence) -> Self {
        seq.frames
    }
}

impl FromIterator<FrameFingerprint> for FingerprintSequence {
    fn from_iter<I: IntoIterator<Item = FrameFingerprint>>(iter: I) -> Self {
        Self::new(iter)
    }
}

//Utilities for testing
#[cfg(any(feature = "test-util", test))]
#[doc(hidden)]
pub mod test_util {
    use rand::prelude::*;

    use super::FrameFingerprint;
    use crate::{FrameHash, VisualStats};

    pub const TEST_EMBEDDING_LEN: usize = 16;

    #[doc(hidden)]
    impl FrameFingerprint {
        /// A fingerprint with every signal present and random contents.
        pub fn random_fingerprint(timestamp: f64, rng: &mut StdRng) -> Self {
            let embedding = (0..TEST_EMBEDDING_LEN)
                .map(|_| rng.random_range(-1.0..=1.0))
                .collect::<Vec<f32>>();

            let stats = VisualStats::new(
                rng.random_range(0.0..255.0),
                rng.random_range(0.0..128.0),
                rng.random_range(0.0..1.0),
                rng.random_range(0.0..2000.0),
            );

            Self::new(timestamp)
                .expect("test timestamps are valid")
                .with_perceptual_hash(FrameHash::random_hash(rng))
                .with_dct_hash(FrameHash::random_hash(rng))
                .with_embedding(embedding)
                .expect("random embeddings are finite")
                .with_visual_stats(stats)
                .expect("random stats are non-negative")
        }

        /// A fingerprint for which extraction failed entirely.
        pub fn signalless(timestamp: f64) -> Self {
            Self::new(timestamp).expect("test timestamps are valid")
        }

        /// The same content, seen at a different time.
        #[must_use]
        pub fn with_timestamp(&self, timestamp: f64) -> Self {
            let mut ret = self.clone();
            ret.timestamp = timestamp;
            ret
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::VisualStats;

    #[test]
    fn test_rejects_invalid_timestamps() {
        assert_eq!(
            FrameFingerprint::new(-1.0),
            Err(Error::InvalidTimestamp(-1.0))
        );
        assert!(FrameFingerprint::new(f64::NAN).is_err());
        assert!(FrameFingerprint::new(f64::INFINITY).is_err());
        assert!(FrameFingerprint::new(0.0).is_ok());
    }

    #[test]
    fn test_empty_embedding_is_absent() {
        let fp = FrameFingerprint::new(0.0)
            .unwrap()
            .with_embedding(vec![])
            .unwrap();
        assert_eq!(fp.embedding(), None);
        assert!(!fp.has_signal());
    }

    #[test]
    fn test_non_finite_embedding_is_rejected() {
        let res = FrameFingerprint::new(0.0)
            .unwrap()
            .with_embedding(vec![1.0, f32::NAN]);
        assert_eq!(res, Err(Error::InvalidEmbedding));
    }

    #[test]
    fn test_invalid_visual_stats_are_rejected() {
        let nan = VisualStats {
            brightness: Some(f64::NAN),
            ..VisualStats::default()
        };
        let res = FrameFingerprint::new(0.0).unwrap().with_visual_stats(nan);
        assert!(matches!(res, Err(Error::InvalidVisualStat { .. })));

        let negative = r#"{"phash": "00ff", "visual_stats": {"brightness": -5.0}}"#;
        assert!(serde_json::from_str::<FrameFingerprint>(negative).is_err());
    }

    #[test]
    fn test_sequence_is_sorted_by_timestamp() {
        let seq = FingerprintSequence::new([
            FrameFingerprint::signalless(2.0),
            FrameFingerprint::signalless(0.5),
            FrameFingerprint::signalless(1.0),
        ]);
        let timestamps = seq.frames().iter().map(FrameFingerprint::timestamp).collect::<Vec<_>>();
        assert_eq!(timestamps, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_sample_evenly() {
        let seq = (0..25)
            .map(|i| FrameFingerprint::signalless(f64::from(i)))
            .collect::<FingerprintSequence>();

        let sampled = seq.sample_evenly(10);
        let timestamps = sampled.iter().map(|fp| fp.timestamp()).collect::<Vec<_>>();
        assert_eq!(
            timestamps,
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0]
        );

        assert_eq!(seq.sample_evenly(100).len(), 25);
        assert_eq!(seq.sample_evenly(25).len(), 25);
        assert!(seq.sample_evenly(0).is_empty());
    }

    #[test]
    fn test_deserializes_extractor_output() {
        let json = r#"[
            {
                "timestamp": 1.5,
                "phash": "ff00",
                "dct_hash": "",
                "tf_embedding": [0.5, 0.5],
                "advanced_features": {
                    "brightness": 100.0,
                    "edge_density": 0.2,
                    "dominant_colors": [[1, 2, 3]]
                }
            },
            { "timestamp": 0.5, "perceptual_hash": null }
        ]"#;

        let seq: FingerprintSequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.len(), 2);

        let first = &seq.frames()[0];
        assert_eq!(first.timestamp(), 0.5);
        assert!(!first.has_signal());

        let second = &seq.frames()[1];
        assert_eq!(second.perceptual_hash(), Some(&FrameHash::from_u64(0xff00)));
        assert_eq!(second.dct_hash(), None);
        assert_eq!(second.embedding(), Some(&[0.5f32, 0.5][..]));
        assert_eq!(
            *second.visual_stats(),
            VisualStats {
                brightness: Some(100.0),
                edge_density: Some(0.2),
                ..VisualStats::default()
            }
        );
    }

    #[test]
    fn test_deserialize_rejects_negative_timestamp() {
        let res = serde_json::from_str::<FrameFingerprint>(r#"{"timestamp": -3.0}"#);
        assert!(res.is_err());
    }
}
