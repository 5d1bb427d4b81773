use serde::{Deserialize, Serialize};

use crate::{definitions::VISUAL_STATS_EPSILON, Error};

/// Scalar statistics describing the look of a frame.
///
/// Each statistic is independently optional: the extractor may only manage a subset of them.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct VisualStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "edgeDensity")]
    pub edge_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
}

impl VisualStats {
    #[must_use]
    pub const fn new(brightness: f64, contrast: f64, edge_density: f64, complexity: f64) -> Self {
        Self {
            brightness: Some(brightness),
            contrast: Some(contrast),
            edge_density: Some(edge_density),
            complexity: Some(complexity),
        }
    }

    /// True if no statistic is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.brightness.is_none()
            && self.contrast.is_none()
            && self.edge_density.is_none()
            && self.complexity.is_none()
    }

    /// Check that every present statistic is finite and non-negative.
    ///
    /// # Errors
    /// Returns [`Error::InvalidVisualStat`] naming the first offending statistic.
    pub fn validate(&self) -> Result<(), Error> {
        let names = ["brightness", "contrast", "edge_density", "complexity"];
        for (name, value) in names.into_iter().zip(self.fields()) {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(Error::InvalidVisualStat {
                        name: name.to_string(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    fn fields(&self) -> [Option<f64>; 4] {
        [
            self.brightness,
            self.contrast,
            self.edge_density,
            self.complexity,
        ]
    }

    /// Mean over the statistics present on both sides of `1 - |v1 - v2| / max(|v1|, |v2|, eps)`.
    ///
    /// Returns `None` when the two sides share no statistic. Non-finite values count as absent.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> Option<f64> {
        let (sum, count) = self
            .fields()
            .into_iter()
            .zip(other.fields())
            .filter_map(|pair| match pair {
                (Some(v1), Some(v2)) if v1.is_finite() && v2.is_finite() => {
                    Some(stat_similarity(v1, v2))
                }
                _ => None,
            })
            .fold((0.0, 0u32), |(sum, count), sim| (sum + sim, count + 1));

        (count > 0).then(|| sum / f64::from(count))
    }
}

fn stat_similarity(v1: f64, v2: f64) -> f64 {
    let scale = v1.abs().max(v2.abs()).max(VISUAL_STATS_EPSILON);
    (1.0 - (v1 - v2).abs() / scale).clamp(0.0, 1.0)
}
