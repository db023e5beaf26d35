//! Menu-photo scoring strategies.
//!
//! The signals are deliberately cheap: the photo's aspect ratio (known from
//! API metadata) and its downloaded byte size. The verdict is advisory; it
//! routes photos into the menus folder, nothing more.

use serde::Deserialize;

/// Signals for one photo. Extraction is the caller's job; the scorer never
/// touches pixels.
#[derive(Debug, Clone, Copy)]
pub struct PhotoSignals {
    /// Width over height.
    pub aspect_ratio: f64,
    pub byte_size: u64,
}

/// Named weights and the decision threshold for [`WeightedScorer`]. All
/// three are plain configuration, swappable without code changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub aspect_weight: f64,
    pub size_weight: f64,
    pub threshold: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { aspect_weight: 0.5, size_weight: 0.5, threshold: 0.5 }
    }
}

/// A menu-photo scoring strategy: a confidence in `[0, 1]` plus the yes/no
/// cut the pipeline acts on.
pub trait MenuScorer {
    fn score(&self, signals: &PhotoSignals) -> f64;

    fn is_menu(&self, signals: &PhotoSignals) -> bool;
}

/// The stock two-signal strategy. Printed menus photograph tall (portrait
/// aspect around 0.6-0.8) and text-dense, so both signals nudge the
/// confidence up; the size signal saturates at `SIZE_SATURATION_BYTES`.
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    weights: ScoreWeights,
}

const PORTRAIT_RANGE: (f64, f64) = (0.6, 0.8);
const SIZE_SATURATION_BYTES: f64 = 500_000.0;

impl WeightedScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }
}

impl MenuScorer for WeightedScorer {
    fn score(&self, signals: &PhotoSignals) -> f64 {
        let total = self.weights.aspect_weight + self.weights.size_weight;
        if total <= 0.0 {
            return 0.0;
        }

        let aspect_signal =
            if (PORTRAIT_RANGE.0..=PORTRAIT_RANGE.1).contains(&signals.aspect_ratio) {
                1.0
            } else {
                0.0
            };
        let size_signal = (signals.byte_size as f64 / SIZE_SATURATION_BYTES).min(1.0);

        (self.weights.aspect_weight * aspect_signal + self.weights.size_weight * size_signal)
            / total
    }

    fn is_menu(&self, signals: &PhotoSignals) -> bool {
        self.score(signals) >= self.weights.threshold
    }
}
