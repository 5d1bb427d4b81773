use serde::{Deserialize, Serialize};

use super::frame_fingerprint::FrameFingerprint;
use crate::definitions::{
    DCT_HASH_WEIGHT, EMBEDDING_WEIGHT, PERCEPTUAL_HASH_WEIGHT, VISUAL_STATS_WEIGHT,
};

/// The independent signals that are fused into a frame similarity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    PerceptualHash,
    DctHash,
    Embedding,
    VisualStats,
}

impl SignalKind {
    pub const ALL: [Self; 4] = [
        Self::PerceptualHash,
        Self::DctHash,
        Self::Embedding,
        Self::VisualStats,
    ];
}

/// Relative importance of each signal when all four are present. When a signal is missing its
/// weight is shared out proportionally among the signals that remain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub perceptual_hash: f64,
    pub dct_hash: f64,
    pub embedding: f64,
    pub visual_stats: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            perceptual_hash: PERCEPTUAL_HASH_WEIGHT,
            dct_hash: DCT_HASH_WEIGHT,
            embedding: EMBEDDING_WEIGHT,
            visual_stats: VISUAL_STATS_WEIGHT,
        }
    }
}

impl FusionWeights {
    #[must_use]
    pub const fn weight(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::PerceptualHash => self.perceptual_hash,
            SignalKind::DctHash => self.dct_hash,
            SignalKind::Embedding => self.embedding,
            SignalKind::VisualStats => self.visual_stats,
        }
    }

    /// Negative or non-finite weights become 0. If no weight is left, the defaults are used.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let ret = Self {
            perceptual_hash: clean(self.perceptual_hash),
            dct_hash: clean(self.dct_hash),
            embedding: clean(self.embedding),
            visual_stats: clean(self.visual_stats),
        };

        let total: f64 = SignalKind::ALL.into_iter().map(|kind| ret.weight(kind)).sum();
        if total > 0.0 && total.is_finite() {
            ret
        } else {
            warn!(target: "similarity", "Unusable fusion weights {self:?}, using the defaults");
            Self::default()
        }
    }
}

/// Per-signal similarity of two fingerprints. A signal is `None` when it could not be compared.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalScores {
    pub perceptual_hash: Option<f64>,
    pub dct_hash: Option<f64>,
    pub embedding: Option<f64>,
    pub visual_stats: Option<f64>,
}

impl SignalScores {
    #[must_use]
    pub const fn score(&self, kind: SignalKind) -> Option<f64> {
        match kind {
            SignalKind::PerceptualHash => self.perceptual_hash,
            SignalKind::DctHash => self.dct_hash,
            SignalKind::Embedding => self.embedding,
            SignalKind::VisualStats => self.visual_stats,
        }
    }

    /// The signals that could be compared.
    pub fn present(&self) -> impl Iterator<Item = SignalKind> + '_ {
        SignalKind::ALL
            .into_iter()
            .filter(|kind| self.score(*kind).is_some())
    }

    /// Weighted mean of the present signals, renormalized over their weights. 0.0 when nothing
    /// could be compared.
    #[must_use]
    pub fn fuse(&self, weights: &FusionWeights) -> f64 {
        let (weighted_sum, weight_total, count, last_score) = SignalKind::ALL
            .into_iter()
            .filter_map(|kind| Some((self.score(kind)?, weights.weight(kind))))
            .fold(
                (0.0, 0.0, 0u32, 0.0),
                |(sum, total, count, _), (score, weight)| {
                    (sum + weight * score, total + weight, count + 1, score)
                },
            );

        if weight_total.is_nan() || weight_total <= 0.0 {
            return 0.0;
        }

        //a lone signal is its own score, without a round trip through its weight.
        let fused = if count == 1 {
            last_score
        } else {
            weighted_sum / weight_total
        };
        fused.clamp(0.0, 1.0)
    }
}

/// Fuses hash, embedding and visual-statistic distances between two fingerprints into a single
/// similarity in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairwiseSimilarity {
    weights: FusionWeights,
}

impl PairwiseSimilarity {
    /// Uses [`FusionWeights::sanitized`] weights.
    #[must_use]
    pub fn with_weights(weights: FusionWeights) -> Self {
        Self {
            weights: weights.sanitized(),
        }
    }

    #[must_use]
    pub const fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// The fused similarity of two fingerprints. Symmetric in its arguments.
    #[must_use]
    pub fn similarity(&self, a: &FrameFingerprint, b: &FrameFingerprint) -> f64 {
        Self::signals(a, b).fuse(&self.weights)
    }

    /// The individual signal similarities behind [`Self::similarity`].
    #[must_use]
    pub fn signals(a: &FrameFingerprint, b: &FrameFingerprint) -> SignalScores {
        let hash_sim = |x: Option<&crate::FrameHash>, y: Option<&crate::FrameHash>| {
            x.zip(y).and_then(|(x, y)| x.similarity(y))
        };

        SignalScores {
            perceptual_hash: hash_sim(a.perceptual_hash(), b.perceptual_hash()),
            dct_hash: hash_sim(a.dct_hash(), b.dct_hash()),
            embedding: a
                .embedding()
                .zip(b.embedding())
                .and_then(|(x, y)| cosine_similarity(x, y)),
            visual_stats: a.visual_stats().similarity(b.visual_stats()),
        }
    }
}

/// Cosine similarity clamped into `0.0..=1.0`, so opposing vectors count as unrelated.
/// `None` for empty vectors, vectors of differing lengths, or zero vectors.
fn cosine_similarity(x: &[f32], y: &[f32]) -> Option<f64> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }

    let (dot, norm_x, norm_y) = x.iter().zip(y).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, norm_x, norm_y), (&a, &b)| {
            let (a, b) = (f64::from(a), f64::from(b));
            (dot + a * b, norm_x + a * a, norm_y + b * b)
        },
    );

    let denom = (norm_x * norm_y).sqrt();
    (denom > 0.0).then(|| (dot / denom).clamp(0.0, 1.0))
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;
    use crate::{FrameHash, VisualStats};

    fn hash_only(phash: u64) -> FrameFingerprint {
        FrameFingerprint::new(0.0)
            .unwrap()
            .with_perceptual_hash(FrameHash::from_u64(phash))
    }

    #[test]
    fn test_identical_fingerprints_are_fully_similar() {
        let mut rng = StdRng::seed_from_u64(1);
        let sim = PairwiseSimilarity::default();
        for _ in 0..100 {
            let fp = FrameFingerprint::random_fingerprint(0.0, &mut rng);
            let s = sim.similarity(&fp, &fp);
            assert!((s - 1.0).abs() < 1e-12, "self similarity was {s}");
        }
    }

    #[test]
    fn test_symmetry() {
        let mut rng = StdRng::seed_from_u64(2);
        let sim = PairwiseSimilarity::default();
        for _ in 0..500 {
            let a = FrameFingerprint::random_fingerprint(0.0, &mut rng);
            let b = FrameFingerprint::random_fingerprint(0.0, &mut rng);
            assert_eq!(sim.similarity(&a, &b), sim.similarity(&b, &a));
        }
    }

    #[test]
    fn test_hash_only_similarity_is_one_minus_k_over_64() {
        let sim = PairwiseSimilarity::default();
        let a = hash_only(0);
        for k in 0..=64u32 {
            let bits = if k == 64 { u64::MAX } else { (1u64 << k) - 1 };
            let b = hash_only(bits);
            assert_eq!(sim.similarity(&a, &b), 1.0 - f64::from(k) / 64.0);
        }
    }

    #[test]
    fn test_no_comparable_signal_is_zero() {
        let sim = PairwiseSimilarity::default();
        let a = FrameFingerprint::signalless(0.0);
        let b = FrameFingerprint::signalless(1.0);
        assert_eq!(sim.similarity(&a, &b), 0.0);
        assert_eq!(sim.similarity(&a, &a), 0.0);

        //signals present on only one side each are still not comparable.
        let phash_only = hash_only(5);
        let dct_only = FrameFingerprint::new(0.0)
            .unwrap()
            .with_dct_hash(FrameHash::from_u64(5));
        assert_eq!(sim.similarity(&phash_only, &dct_only), 0.0);
    }

    #[test]
    fn test_mismatched_hash_lengths_are_excluded_not_penalized() {
        let sim = PairwiseSimilarity::default();
        let stats = VisualStats::new(10.0, 10.0, 0.5, 100.0);

        let a = FrameFingerprint::new(0.0)
            .unwrap()
            .with_perceptual_hash(FrameHash::from_u64(0))
            .with_visual_stats(stats)
            .unwrap();
        let b = FrameFingerprint::new(0.0)
            .unwrap()
            .with_perceptual_hash(FrameHash::from_hex(&"f".repeat(32)).unwrap())
            .with_visual_stats(stats)
            .unwrap();

        assert_eq!(PairwiseSimilarity::signals(&a, &b).perceptual_hash, None);
        assert_eq!(sim.similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_missing_embedding_renormalizes_weights() {
        let sim = PairwiseSimilarity::default();
        let a = FrameFingerprint::new(0.0)
            .unwrap()
            .with_perceptual_hash(FrameHash::from_u64(0))
            .with_dct_hash(FrameHash::from_u64(0));
        //perceptual identical, dct differs in all bits.
        let b = FrameFingerprint::new(0.0)
            .unwrap()
            .with_perceptual_hash(FrameHash::from_u64(0))
            .with_dct_hash(FrameHash::from_u64(u64::MAX));

        let expected = PERCEPTUAL_HASH_WEIGHT / (PERCEPTUAL_HASH_WEIGHT + DCT_HASH_WEIGHT);
        assert!((sim.similarity(&a, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_all_signals_use_default_weights() {
        let scores = SignalScores {
            perceptual_hash: Some(1.0),
            dct_hash: Some(0.0),
            embedding: Some(1.0),
            visual_stats: Some(0.0),
        };
        let fused = scores.fuse(&FusionWeights::default());
        assert!((fused - 0.6).abs() < 1e-12);
        assert_eq!(
            scores.present().collect::<Vec<_>>(),
            SignalKind::ALL.to_vec()
        );
    }

    #[test]
    fn test_unusable_weights_are_cleaned() {
        let weights = FusionWeights {
            perceptual_hash: f64::NAN,
            dct_hash: -1.0,
            embedding: 0.5,
            visual_stats: f64::INFINITY,
        }
        .sanitized();
        assert_eq!(
            weights,
            FusionWeights {
                perceptual_hash: 0.0,
                dct_hash: 0.0,
                embedding: 0.5,
                visual_stats: 0.0,
            }
        );

        let nothing_left = FusionWeights {
            perceptual_hash: 0.0,
            dct_hash: -0.5,
            embedding: f64::NAN,
            visual_stats: 0.0,
        };
        assert_eq!(nothing_left.sanitized(), FusionWeights::default());

        //a NaN weight would otherwise poison every fused score.
        let sim = PairwiseSimilarity::with_weights(FusionWeights {
            perceptual_hash: f64::NAN,
            ..FusionWeights::default()
        });
        let a = hash_only(0);
        assert_eq!(sim.similarity(&a, &a), 0.0);
        assert_eq!(sim.weights().perceptual_hash, 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]), Some(1.0));
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }
}
