//! Weighted scoring and ranking of a whole ETF batch.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ranking_core::{EtfEntry, Feature, FeatureSet, RankedEtf, RawMetrics, ScoreBreakdown};

use crate::features::extract_features;
use crate::metrics::EtfMetrics;
use crate::normalize::{compile_feature_matrix, normalize_feature_matrix, NormalizedFeatures};
use crate::policy::{ScoringPolicy, WeightTable};

/// Turn the provider's symbol map into scoreable entries.
///
/// Symbols with no record, an empty record, or a record holding only nulls
/// are dropped: they would only add an all-neutral row to the batch.
pub fn build_etf_entries<I>(data: I) -> Vec<EtfEntry>
where
    I: IntoIterator<Item = (String, Option<RawMetrics>)>,
{
    let mut dropped = 0usize;
    let entries: Vec<EtfEntry> = data
        .into_iter()
        .filter_map(|(symbol, metrics)| match metrics {
            Some(metrics) if metrics.has_usable_values() => Some(EtfEntry { symbol, metrics }),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();

    if dropped > 0 {
        tracing::debug!("Dropped {} symbols without usable metrics", dropped);
    }
    entries
}

/// Ranks ETFs by a blend of fundamentals and opportunity sub-scores
pub struct EtfScorer {
    policy: ScoringPolicy,
}

impl Default for EtfScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl EtfScorer {
    /// Create a scorer with the canonical policy
    pub fn new() -> Self {
        Self {
            policy: ScoringPolicy::default(),
        }
    }

    /// Create a scorer with a custom policy
    pub fn with_policy(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score and sort a batch. Output order: final score descending, then
    /// fundamentals descending, then symbol ascending.
    pub fn score(&self, entries: Vec<EtfEntry>) -> Vec<RankedEtf> {
        if entries.is_empty() {
            return Vec::new();
        }

        // Extraction is per ETF; normalization waits for the full batch.
        let feature_sets: Vec<FeatureSet> = entries
            .iter()
            .map(|entry| extract_features(&EtfMetrics::from_raw(&entry.metrics)))
            .collect();
        let matrix = compile_feature_matrix(&feature_sets, &self.policy);
        let normalized = normalize_feature_matrix(&matrix, &self.policy);

        let mut ranked: Vec<RankedEtf> = entries
            .into_iter()
            .zip(feature_sets)
            .enumerate()
            .map(|(index, (entry, features))| {
                let scores = self.score_one(&normalized, index, &features);
                RankedEtf {
                    symbol: entry.symbol,
                    raw: entry.metrics,
                    features,
                    scores,
                }
            })
            .collect();

        ranked.sort_by(compare_ranked);

        let penalized = ranked.iter().filter(|r| r.scores.value_trap).count();
        tracing::debug!(
            "Scored {} ETFs ({} value-trap penalties)",
            ranked.len(),
            penalized
        );

        ranked
    }

    fn score_one(
        &self,
        normalized: &NormalizedFeatures,
        index: usize,
        features: &FeatureSet,
    ) -> ScoreBreakdown {
        let (fundamentals, fundamentals_components) =
            weighted_score(&self.policy.fundamentals, normalized, index);
        let (mut opportunity, mut opportunity_components) =
            weighted_score(&self.policy.opportunity, normalized, index);

        let guard = &self.policy.value_trap;
        let value_trap = guard.triggers(features.rsi, features.volume_pulse);
        if value_trap {
            opportunity *= guard.penalty;
            for component in opportunity_components.values_mut() {
                *component *= guard.penalty;
            }
        }

        let alpha = self.policy.fundamentals_blend;
        let final_score = alpha * fundamentals + (1.0 - alpha) * opportunity;

        ScoreBreakdown {
            fundamentals,
            opportunity,
            final_score,
            fundamentals_components,
            opportunity_components,
            value_trap,
        }
    }
}

/// Weighted mean of normalized scores, divided by the table's own total.
fn weighted_score(
    table: &WeightTable,
    normalized: &NormalizedFeatures,
    index: usize,
) -> (f64, BTreeMap<Feature, f64>) {
    let components: BTreeMap<Feature, f64> = table
        .iter()
        .map(|(feature, weight)| (feature, normalized.score(feature, index) * weight))
        .collect();

    let total_weight = table.total();
    let score = if total_weight > 0.0 {
        components.values().sum::<f64>() / total_weight
    } else {
        crate::stats::NEUTRAL_SCORE
    };

    (score, components)
}

pub(crate) fn compare_ranked(a: &RankedEtf, b: &RankedEtf) -> Ordering {
    b.scores
        .final_score
        .total_cmp(&a.scores.final_score)
        .then_with(|| b.scores.fundamentals.total_cmp(&a.scores.fundamentals))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Score a batch with the canonical policy
pub fn score_etfs(entries: Vec<EtfEntry>) -> Vec<RankedEtf> {
    EtfScorer::new().score(entries)
}
