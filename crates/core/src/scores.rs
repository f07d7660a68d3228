use serde::{Deserialize, Serialize};

/// Default blend used whenever a task configures no weights at all.
pub const DEFAULT_WEIGHTS: Weights = Weights {
    tests: 0.5,
    lint: 0.2,
    rubric: 0.3,
};

/// Per-layer weights for the composite scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default)]
    pub tests: f64,
    #[serde(default)]
    pub lint: f64,
    #[serde(default)]
    pub rubric: f64,
}

impl Weights {
    fn is_all_zero(self) -> bool {
        self.tests == 0.0 && self.lint == 0.0 && self.rubric == 0.0
    }

    /// Returns these weights, or [`DEFAULT_WEIGHTS`] if all three are zero.
    #[must_use]
    pub fn or_default(self) -> Self {
        if self.is_all_zero() { DEFAULT_WEIGHTS } else { self }
    }
}

/// The three validation-layer scores, each in `[0, 1]`. A layer that could
/// not be evaluated is represented as `0.0` ("unavailable").
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub tests: f64,
    pub static_analysis: f64,
    pub rubric: f64,
}

impl Scores {
    /// Weighted average of the three layers, falling back to
    /// [`DEFAULT_WEIGHTS`] when every configured weight is zero. The
    /// denominator is always positive since the default weights sum to 1.0,
    /// so this is always well-defined.
    #[must_use]
    pub fn composite(self, weights: Weights) -> f64 {
        let weights = weights.or_default();
        let weight_sum = weights.tests + weights.lint + weights.rubric;
        let weighted = self.tests * weights.tests
            + self.static_analysis * weights.lint
            + self.rubric * weights.rubric;
        weighted / weight_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weights_fall_back_to_defaults() {
        let scores = Scores {
            tests: 1.0,
            static_analysis: 1.0,
            rubric: 1.0,
        };
        let composite = scores.composite(Weights {
            tests: 0.0,
            lint: 0.0,
            rubric: 0.0,
        });
        assert!((composite - 1.0).abs() < 1e-9);
    }

    #[test]
    fn composite_is_weighted_average() {
        let scores = Scores {
            tests: 1.0,
            static_analysis: 0.0,
            rubric: 0.5,
        };
        let weights = Weights {
            tests: 1.0,
            lint: 1.0,
            rubric: 2.0,
        };
        // (1*1 + 0*1 + 0.5*2) / 4 = 2/4 = 0.5
        let composite = scores.composite(weights);
        assert!((composite - 0.5).abs() < 1e-9);
    }

    #[test]
    fn composite_always_in_unit_range_for_unit_scores() {
        let scores = Scores {
            tests: 0.7,
            static_analysis: 0.8,
            rubric: 0.6,
        };
        let weights = Weights {
            tests: 3.0,
            lint: 1.0,
            rubric: 0.0,
        };
        let composite = scores.composite(weights);
        assert!((0.0..=1.0).contains(&composite));
    }
}
