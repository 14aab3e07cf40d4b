use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw field as delivered by the screener provider.
///
/// The payload is mostly numbers, strings and nulls, but a few fields
/// (`tags`, `optionable`) arrive as lists or booleans and must not fail the
/// whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Null,
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<MetricValue>),
    Other(serde_json::Value),
}

impl MetricValue {
    /// Finite numeric reading of the value; numeric strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) if n.is_finite() => Some(*n),
            MetricValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Null, or a string with nothing in it.
    pub fn is_empty(&self) -> bool {
        match self {
            MetricValue::Null => true,
            MetricValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Field name -> value map for one ETF. Immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMetrics(BTreeMap<String, MetricValue>);

impl RawMetrics {
    pub fn new(fields: BTreeMap<String, MetricValue>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.0.get(key)
    }

    /// Null-preserving numeric read: absent, null or unparseable -> `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetricValue::as_f64)
    }

    /// Non-empty string read.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(MetricValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// At least one field carries something other than null.
    pub fn has_usable_values(&self) -> bool {
        self.0.values().any(|v| !matches!(v, MetricValue::Null))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, MetricValue)> for RawMetrics {
    fn from_iter<I: IntoIterator<Item = (K, MetricValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Screener payload: `{ status, data: { data: { SYMBOL: { field: value } } } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub status: u16,
    #[serde(default)]
    pub data: SnapshotData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub data: BTreeMap<String, Option<RawMetrics>>,
}

/// One ETF going into a ranking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfEntry {
    pub symbol: String,
    pub metrics: RawMetrics,
}

/// Derived signals used by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    ExpenseRatio,
    LiquidityComposite,
    Holdings,
    AssetsLog,
    IssuerScore,
    RiskAdjustedReturn,
    DividendYield,
    DividendStability,
    TrackingEfficiency,
    RiskBalance,
    IntradayMomentum,
    DiscountFromHigh,
    DistanceFromLow,
    MovingAverageCombo,
    Rsi,
    VolumePulse,
    Momentum1m,
    GapSignal,
}

impl Feature {
    pub const ALL: [Feature; 18] = [
        Feature::ExpenseRatio,
        Feature::LiquidityComposite,
        Feature::Holdings,
        Feature::AssetsLog,
        Feature::IssuerScore,
        Feature::RiskAdjustedReturn,
        Feature::DividendYield,
        Feature::DividendStability,
        Feature::TrackingEfficiency,
        Feature::RiskBalance,
        Feature::IntradayMomentum,
        Feature::DiscountFromHigh,
        Feature::DistanceFromLow,
        Feature::MovingAverageCombo,
        Feature::Rsi,
        Feature::VolumePulse,
        Feature::Momentum1m,
        Feature::GapSignal,
    ];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::ExpenseRatio => "expenseRatio",
            Feature::LiquidityComposite => "liquidityComposite",
            Feature::Holdings => "holdings",
            Feature::AssetsLog => "assetsLog",
            Feature::IssuerScore => "issuerScore",
            Feature::RiskAdjustedReturn => "riskAdjustedReturn",
            Feature::DividendYield => "dividendYield",
            Feature::DividendStability => "dividendStability",
            Feature::TrackingEfficiency => "trackingEfficiency",
            Feature::RiskBalance => "riskBalance",
            Feature::IntradayMomentum => "intradayMomentum",
            Feature::DiscountFromHigh => "discountFromHigh",
            Feature::DistanceFromLow => "distanceFromLow",
            Feature::MovingAverageCombo => "movingAverageCombo",
            Feature::Rsi => "rsi",
            Feature::VolumePulse => "volumePulse",
            Feature::Momentum1m => "momentum1m",
            Feature::GapSignal => "gapSignal",
        }
    }
}

/// Derived features for one ETF. `None` means unavailable, scored as neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub expense_ratio: Option<f64>,
    pub liquidity_composite: Option<f64>,
    pub holdings: Option<f64>,
    pub assets_log: Option<f64>,
    pub issuer_score: Option<f64>,
    pub risk_adjusted_return: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub dividend_stability: Option<f64>,
    pub tracking_efficiency: Option<f64>,
    pub risk_balance: Option<f64>,
    pub intraday_momentum: Option<f64>,
    pub discount_from_high: Option<f64>,
    pub distance_from_low: Option<f64>,
    pub moving_average_combo: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_pulse: Option<f64>,
    pub momentum_1m: Option<f64>,
    pub gap_signal: Option<f64>,
}

impl FeatureSet {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::ExpenseRatio => self.expense_ratio,
            Feature::LiquidityComposite => self.liquidity_composite,
            Feature::Holdings => self.holdings,
            Feature::AssetsLog => self.assets_log,
            Feature::IssuerScore => self.issuer_score,
            Feature::RiskAdjustedReturn => self.risk_adjusted_return,
            Feature::DividendYield => self.dividend_yield,
            Feature::DividendStability => self.dividend_stability,
            Feature::TrackingEfficiency => self.tracking_efficiency,
            Feature::RiskBalance => self.risk_balance,
            Feature::IntradayMomentum => self.intraday_momentum,
            Feature::DiscountFromHigh => self.discount_from_high,
            Feature::DistanceFromLow => self.distance_from_low,
            Feature::MovingAverageCombo => self.moving_average_combo,
            Feature::Rsi => self.rsi,
            Feature::VolumePulse => self.volume_pulse,
            Feature::Momentum1m => self.momentum_1m,
            Feature::GapSignal => self.gap_signal,
        }
    }

    /// Count of features that could be derived
    pub fn available_count(&self) -> usize {
        Feature::ALL.iter().filter(|f| self.get(**f).is_some()).count()
    }
}

/// Per-ETF score decomposition, every score on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub fundamentals: f64,
    pub opportunity: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
    pub fundamentals_components: BTreeMap<Feature, f64>,
    pub opportunity_components: BTreeMap<Feature, f64>,
    /// Whether the oversold-without-volume penalty was applied
    #[serde(default)]
    pub value_trap: bool,
}

/// The unit handed to every consumer of the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEtf {
    pub symbol: String,
    pub raw: RawMetrics,
    pub features: FeatureSet,
    pub scores: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accepts_mixed_field_types() {
        let payload = r#"{
            "status": 200,
            "data": { "data": {
                "VOO": { "expenseRatio": 0.03, "issuer": "Vanguard", "rsi": "48.5",
                         "tags": ["index", "large-cap"], "optionable": true, "atr": null },
                "EMPTY": {},
                "GONE": null
            } }
        }"#;

        let snapshot: MarketSnapshot = serde_json::from_str(payload).unwrap();
        assert_eq!(snapshot.status, 200);
        assert_eq!(snapshot.data.data.len(), 3);

        let voo = snapshot.data.data["VOO"].as_ref().unwrap();
        assert_eq!(voo.number("expenseRatio"), Some(0.03));
        assert_eq!(voo.number("rsi"), Some(48.5));
        assert_eq!(voo.number("atr"), None);
        assert_eq!(voo.text("issuer"), Some("Vanguard"));
        assert!(matches!(voo.get("tags"), Some(MetricValue::List(_))));
        assert!(snapshot.data.data["GONE"].is_none());
    }

    #[test]
    fn test_metric_value_numeric_coercion() {
        assert_eq!(MetricValue::Number(1.5).as_f64(), Some(1.5));
        assert_eq!(MetricValue::Text(" 2.25 ".to_string()).as_f64(), Some(2.25));
        assert_eq!(MetricValue::Text("n/a".to_string()).as_f64(), None);
        assert_eq!(MetricValue::Text("inf".to_string()).as_f64(), None);
        // Blank and hex strings are unavailable, not zero
        assert_eq!(MetricValue::Text(String::new()).as_f64(), None);
        assert_eq!(MetricValue::Text("   ".to_string()).as_f64(), None);
        assert_eq!(MetricValue::Text("0x10".to_string()).as_f64(), None);
        assert_eq!(MetricValue::Number(f64::NAN).as_f64(), None);
        assert_eq!(MetricValue::Null.as_f64(), None);
        assert_eq!(MetricValue::Flag(true).as_f64(), None);
    }

    #[test]
    fn test_usable_values() {
        let all_null: RawMetrics = [("rsi", MetricValue::Null), ("atr", MetricValue::Null)]
            .into_iter()
            .collect();
        assert!(!all_null.is_empty());
        assert!(!all_null.has_usable_values());

        let some: RawMetrics = [("rsi", MetricValue::Number(40.0))].into_iter().collect();
        assert!(some.has_usable_values());
    }

    #[test]
    fn test_score_breakdown_wire_names() {
        let mut components = BTreeMap::new();
        components.insert(Feature::Momentum1m, 4.0);
        let scores = ScoreBreakdown {
            fundamentals: 60.0,
            opportunity: 40.0,
            final_score: 51.0,
            fundamentals_components: BTreeMap::new(),
            opportunity_components: components,
            value_trap: false,
        };

        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["final"], 51.0);
        assert_eq!(json["opportunityComponents"]["momentum1m"], 4.0);
        assert_eq!(Feature::Momentum1m.as_str(), "momentum1m");
    }
}
