//! Indicator coverage check over a screener snapshot.
//!
//! Reports indicators for which not a single ETF carries a value, which
//! usually means the provider dropped or renamed a field.

use std::collections::HashSet;

use ranking_core::{MarketSnapshot, RawMetrics, SCREENER_FIELDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reading {
    /// First non-empty value among the keys
    Keys,
    /// `ch1d`, else derived from close and previous close
    DayChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub label: String,
    pub keys: Vec<&'static str>,
    reading: Reading,
}

impl Indicator {
    fn new(label: &str, keys: &[&'static str]) -> Self {
        Self {
            label: label.to_string(),
            keys: keys.to_vec(),
            reading: Reading::Keys,
        }
    }

    /// Whether this record carries a usable value for the indicator
    pub fn has_value(&self, record: &RawMetrics) -> bool {
        match self.reading {
            Reading::Keys => self
                .keys
                .iter()
                .any(|key| record.get(key).is_some_and(|v| !v.is_empty())),
            Reading::DayChange => {
                record.get("ch1d").is_some_and(|v| !v.is_empty()) || derive_day_change(record).is_some()
            }
        }
    }
}

/// Percentage change from previous close to close
fn derive_day_change(record: &RawMetrics) -> Option<f64> {
    let close = record.number("close")?;
    let pre_close = record.number("preClose").filter(|p| *p != 0.0)?;
    Some((close - pre_close) / pre_close * 100.0)
}

fn base_indicators() -> Vec<Indicator> {
    vec![
        Indicator::new("Name", &["name"]),
        Indicator::new("Assets", &["assets"]),
        Indicator::new("Asset Class", &["assetClass"]),
        Indicator::new("Stock Price", &["price", "close"]),
        Indicator::new("Holdings", &["holdings", "holdingsCount"]),
        Indicator::new("Volume", &["volume"]),
        Indicator {
            label: "1D Change".to_string(),
            keys: vec!["ch1d", "close", "preClose"],
            reading: Reading::DayChange,
        },
        Indicator::new("Premarket Close", &["premarketClose", "preClose"]),
        Indicator::new("Premarket % Change", &["premarketChangePercent"]),
        Indicator::new(
            "After-hours % Change",
            &["afterHoursChangePercent", "postmarketChangePercent"],
        ),
        Indicator::new("After-hours Price", &["afterHoursPrice", "postmarketPrice"]),
        Indicator::new("After-hours Close", &["afterHoursClose", "postClose"]),
    ]
}

/// Labelled base indicators followed by every other screener field under
/// its own name.
pub fn validation_indicators() -> Vec<Indicator> {
    let mut indicators = base_indicators();
    let covered: HashSet<&str> = indicators
        .iter()
        .flat_map(|i| i.keys.iter().copied())
        .collect();

    indicators.extend(
        SCREENER_FIELDS
            .iter()
            .filter(|field| !covered.contains(*field))
            .map(|field| Indicator::new(field, &[*field])),
    );
    indicators
}

/// Labels of indicators that no ETF in the snapshot has a value for.
/// An empty snapshot reports every indicator.
pub fn find_empty_indicators(snapshot: &MarketSnapshot) -> Vec<String> {
    let records: Vec<&RawMetrics> = snapshot.data.data.values().flatten().collect();

    validation_indicators()
        .into_iter()
        .filter(|indicator| !records.iter().any(|record| indicator.has_value(record)))
        .map(|indicator| indicator.label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ranking_core::{MetricValue, SnapshotData};
    use std::collections::BTreeMap;

    fn snapshot(records: Vec<(&str, RawMetrics)>) -> MarketSnapshot {
        let data: BTreeMap<String, Option<RawMetrics>> = records
            .into_iter()
            .map(|(symbol, raw)| (symbol.to_string(), Some(raw)))
            .collect();
        MarketSnapshot {
            status: 200,
            data: SnapshotData { data },
        }
    }

    #[test]
    fn test_empty_snapshot_reports_everything() {
        let empty = find_empty_indicators(&MarketSnapshot::default());
        assert_eq!(empty.len(), validation_indicators().len());
        assert_eq!(empty[0], "Name");
    }

    #[test]
    fn test_fields_are_not_listed_twice() {
        let indicators = validation_indicators();
        assert!(indicators.iter().any(|i| i.label == "Stock Price"));
        assert!(!indicators.iter().any(|i| i.label == "close"));
        assert!(indicators.iter().any(|i| i.label == "expenseRatio"));
    }

    #[test]
    fn test_fallback_key_counts_as_present() {
        let raw: RawMetrics = [
            ("holdingsCount", MetricValue::Number(50.0)),
            ("name", MetricValue::Text(String::new())),
        ]
        .into_iter()
        .collect();

        let empty = find_empty_indicators(&snapshot(vec![("AAA", raw)]));
        assert!(!empty.contains(&"Holdings".to_string()));
        assert!(empty.contains(&"Name".to_string()));
    }

    #[test]
    fn test_day_change_can_be_derived() {
        let raw: RawMetrics = [
            ("close", MetricValue::Number(101.0)),
            ("preClose", MetricValue::Number(100.0)),
        ]
        .into_iter()
        .collect();
        assert!((derive_day_change(&raw).unwrap() - 1.0).abs() < 1e-9);

        let empty = find_empty_indicators(&snapshot(vec![("AAA", raw)]));
        assert!(!empty.contains(&"1D Change".to_string()));
    }

    #[test]
    fn test_any_etf_with_value_is_enough() {
        let bare: RawMetrics = [("rsi", MetricValue::Null)].into_iter().collect();
        let full: RawMetrics = [("rsi", MetricValue::Number(40.0))].into_iter().collect();

        let empty = find_empty_indicators(&snapshot(vec![("AAA", bare), ("BBB", full)]));
        assert!(!empty.contains(&"rsi".to_string()));
        assert!(empty.contains(&"beta".to_string()));
    }
}
