//! Scoring policy: weight tables, sign inversions, blend ratio and the
//! value-trap guard. These are policy choices, not derived constants.

use ranking_core::Feature;

/// Weighted group of features feeding one sub-score
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: Vec<(Feature, f64)>,
}

impl WeightTable {
    pub fn new(weights: Vec<(Feature, f64)>) -> Self {
        Self { weights }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.weights.iter().copied()
    }

    /// Sum of the table's own weights, used as the divisor
    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.weights.iter().any(|(f, _)| *f == feature)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Structural quality of the fund
    pub fn fundamentals() -> Self {
        Self::new(vec![
            (Feature::ExpenseRatio, 0.12),
            (Feature::LiquidityComposite, 0.12),
            (Feature::Holdings, 0.08),
            (Feature::AssetsLog, 0.06),
            (Feature::IssuerScore, 0.08),
            (Feature::RiskAdjustedReturn, 0.18),
            (Feature::DividendYield, 0.07),
            (Feature::DividendStability, 0.07),
            (Feature::TrackingEfficiency, 0.10),
            (Feature::RiskBalance, 0.12),
        ])
    }

    /// Tactical entry timing
    pub fn opportunity() -> Self {
        Self::new(vec![
            (Feature::IntradayMomentum, 0.12),
            (Feature::DiscountFromHigh, 0.18),
            (Feature::DistanceFromLow, 0.15),
            (Feature::MovingAverageCombo, 0.15),
            (Feature::Rsi, 0.12),
            (Feature::VolumePulse, 0.10),
            (Feature::Momentum1m, 0.08),
            (Feature::GapSignal, 0.10),
        ])
    }
}

/// Penalty for an oversold reading that trading activity does not confirm
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTrapGuard {
    /// Raw RSI strictly below this counts as oversold
    pub rsi_threshold: f64,
    /// Volume pulse strictly below this counts as low activity
    pub volume_pulse_threshold: f64,
    /// Multiplier applied to the opportunity score and its components
    pub penalty: f64,
}

impl Default for ValueTrapGuard {
    fn default() -> Self {
        Self {
            rsi_threshold: 20.0,
            volume_pulse_threshold: 1.0_f64.ln_1p(),
            penalty: 0.85,
        }
    }
}

impl ValueTrapGuard {
    /// Oversold and not backed by above-average volume. A missing volume
    /// pulse counts as unconfirmed.
    pub fn triggers(&self, rsi: Option<f64>, volume_pulse: Option<f64>) -> bool {
        match rsi {
            Some(rsi) if rsi < self.rsi_threshold => {
                volume_pulse.map_or(true, |pulse| pulse < self.volume_pulse_threshold)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub fundamentals: WeightTable,
    pub opportunity: WeightTable,
    /// Share of the final score taken by fundamentals; opportunity gets the rest
    pub fundamentals_blend: f64,
    /// Features where a lower raw value is better
    pub inverted: Vec<Feature>,
    pub winsor_lower: f64,
    pub winsor_upper: f64,
    pub value_trap: ValueTrapGuard,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            fundamentals: WeightTable::fundamentals(),
            opportunity: WeightTable::opportunity(),
            fundamentals_blend: 0.55,
            inverted: vec![
                Feature::ExpenseRatio,
                Feature::TrackingEfficiency,
                Feature::RiskBalance,
                Feature::DiscountFromHigh,
                Feature::DistanceFromLow,
                Feature::MovingAverageCombo,
                Feature::Rsi,
            ],
            winsor_lower: 2.0,
            winsor_upper: 98.0,
            value_trap: ValueTrapGuard::default(),
        }
    }
}

impl ScoringPolicy {
    pub fn is_inverted(&self, feature: Feature) -> bool {
        self.inverted.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_disjoint() {
        let policy = ScoringPolicy::default();
        for (feature, _) in policy.fundamentals.iter() {
            assert!(!policy.opportunity.contains(feature), "{:?} in both tables", feature);
        }
    }

    #[test]
    fn test_weights_in_open_unit_interval() {
        let policy = ScoringPolicy::default();
        for (_, w) in policy.fundamentals.iter().chain(policy.opportunity.iter()) {
            assert!(w > 0.0 && w < 1.0);
        }
        assert!((policy.fundamentals.total() - 1.0).abs() < 1e-9);
        assert!((policy.opportunity.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_trap_trigger() {
        let guard = ValueTrapGuard::default();
        assert!(guard.triggers(Some(15.0), Some(0.5_f64.ln_1p())));
        assert!(guard.triggers(Some(15.0), None));
        assert!(!guard.triggers(Some(15.0), Some(3.0_f64.ln_1p())));
        assert!(!guard.triggers(Some(20.0), Some(0.0)));
        assert!(!guard.triggers(None, Some(0.0)));
    }
}
