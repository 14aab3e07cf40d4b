//! Cross-sectional normalization.
//!
//! Needs the whole batch: every feature column is winsorized and min-max
//! scaled against all ETFs at once, then expanded back per ETF with the
//! neutral score filling the gaps.

use std::collections::BTreeMap;

use ranking_core::{Feature, FeatureSet};

use crate::policy::ScoringPolicy;
use crate::stats::{min_max_scale, winsorize, NEUTRAL_SCORE};

/// Oriented raw values per feature, one slot per ETF, NaN where unavailable.
pub type FeatureMatrix = BTreeMap<Feature, Vec<f64>>;

/// 0-100 scores for one feature, indexed like the input batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaledFeature(Vec<f64>);

impl ScaledFeature {
    /// Score for the ETF at `index`; anything missing is neutral.
    pub fn score(&self, index: usize) -> f64 {
        match self.0.get(index) {
            Some(v) if !v.is_nan() => *v,
            _ => NEUTRAL_SCORE,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized scores for every feature of the batch
#[derive(Debug, Clone, Default)]
pub struct NormalizedFeatures(BTreeMap<Feature, ScaledFeature>);

impl NormalizedFeatures {
    pub fn score(&self, feature: Feature, index: usize) -> f64 {
        self.0
            .get(&feature)
            .map_or(NEUTRAL_SCORE, |scaled| scaled.score(index))
    }

    pub fn get(&self, feature: Feature) -> Option<&ScaledFeature> {
        self.0.get(&feature)
    }
}

/// Lay the batch out column-wise, negating features where lower is better.
pub fn compile_feature_matrix(feature_sets: &[FeatureSet], policy: &ScoringPolicy) -> FeatureMatrix {
    Feature::ALL
        .iter()
        .map(|&feature| {
            let invert = policy.is_inverted(feature);
            let column = feature_sets
                .iter()
                .map(|set| match set.get(feature) {
                    Some(v) if v.is_finite() => {
                        if invert {
                            -v
                        } else {
                            v
                        }
                    }
                    _ => f64::NAN,
                })
                .collect();
            (feature, column)
        })
        .collect()
}

/// Scale one column onto 0-100; NaN slots get the neutral score.
pub fn normalize_column(values: &[f64], lower_percentile: f64, upper_percentile: f64) -> ScaledFeature {
    let available: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if available.is_empty() {
        return ScaledFeature(vec![NEUTRAL_SCORE; values.len()]);
    }

    let winsorized = winsorize(&available, lower_percentile, upper_percentile);
    let mut scaled = min_max_scale(&winsorized, NEUTRAL_SCORE).into_iter();

    let scores = values
        .iter()
        .map(|v| {
            if v.is_finite() {
                scaled.next().unwrap_or(NEUTRAL_SCORE)
            } else {
                NEUTRAL_SCORE
            }
        })
        .collect();

    ScaledFeature(scores)
}

pub fn normalize_feature_matrix(matrix: &FeatureMatrix, policy: &ScoringPolicy) -> NormalizedFeatures {
    NormalizedFeatures(
        matrix
            .iter()
            .map(|(feature, values)| {
                (
                    *feature,
                    normalize_column(values, policy.winsor_lower, policy.winsor_upper),
                )
            })
            .collect(),
    )
}
