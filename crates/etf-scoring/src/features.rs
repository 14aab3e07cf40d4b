//! Per-ETF feature extraction.
//!
//! Each ETF is handled on its own; nothing here looks at the rest of the
//! batch. Unavailable inputs produce `None`, never an error.

use ranking_core::FeatureSet;

use crate::metrics::EtfMetrics;
use crate::stats::mean_of_present;

/// Scores for issuers we recognise
const ISSUER_SCORES: [(&str, f64); 5] = [
    ("Vanguard", 100.0),
    ("BlackRock", 95.0),
    ("State Street", 92.0),
    ("American Century Investments", 75.0),
    ("GraniteShares", 70.0),
];

/// Score for a named issuer missing from the table
pub const DEFAULT_ISSUER_SCORE: f64 = 60.0;

/// Issuer lookup. A missing issuer is `None`; an unknown one gets the default.
pub fn issuer_score(issuer: Option<&str>) -> Option<f64> {
    let issuer = issuer.filter(|s| !s.is_empty())?;
    let score = ISSUER_SCORES
        .iter()
        .find(|(name, _)| *name == issuer)
        .map(|(_, score)| *score)
        .unwrap_or(DEFAULT_ISSUER_SCORE);
    Some(score)
}

/// log10 with the input floored at 1
fn log10_floored(value: Option<f64>) -> Option<f64> {
    value.map(|v| v.max(1.0).log10())
}

/// ln(1 + x) with the input floored at 0
fn log1p_floored(value: Option<f64>) -> Option<f64> {
    value.map(|v| v.max(0.0).ln_1p())
}

/// Clamp to `[lo, hi]` and remap onto `[0, 1]`
fn unit_range(value: f64, lo: f64, hi: f64) -> f64 {
    (value.clamp(lo, hi) - lo) / (hi - lo)
}

fn liquidity_composite(m: &EtfMetrics) -> Option<f64> {
    mean_of_present([
        log10_floored(m.dollar_volume),
        log10_floored(m.volume),
        log1p_floored(m.relative_volume),
    ])
}

fn risk_adjusted_return(sharpe: Option<f64>, sortino: Option<f64>) -> Option<f64> {
    mean_of_present([
        sharpe.map(|s| unit_range(s, -2.0, 5.0)),
        sortino.map(|s| unit_range(s, -2.0, 6.0)),
    ])
}

fn dividend_stability(growth_years: Option<f64>, growth_rate: Option<f64>) -> Option<f64> {
    mean_of_present([
        growth_years.map(|y| unit_range(y, 0.0, 25.0)),
        growth_rate.map(|g| unit_range(g, -5.0, 20.0)),
    ])
}

/// Mean absolute tracking gap; over- and under-tracking count the same.
fn tracking_efficiency(tracking: &[f64]) -> Option<f64> {
    mean_of_present(tracking.iter().map(|v| Some(v.abs())))
}

/// ATR over the reference price, the price floored at 1.
pub fn atr_ratio(m: &EtfMetrics) -> Option<f64> {
    let atr = m.atr?;
    let price = m.reference_price()?;
    Some(atr / price.max(1.0))
}

fn risk_balance(m: &EtfMetrics) -> Option<f64> {
    let beta_deviation = m.beta.map(|b| (b - 1.0).abs());
    mean_of_present([beta_deviation, atr_ratio(m)])
}

fn moving_average_combo(m: &EtfMetrics) -> Option<f64> {
    mean_of_present([
        m.ma20_change,
        m.ma50_change,
        m.ma150_change,
        m.ma200_change,
    ])
}

fn gap_signal(m: &EtfMetrics) -> Option<f64> {
    mean_of_present([m.premarket_change_percent, m.after_hours_change_percent])
}

/// Derive the full feature set for one ETF
pub fn extract_features(m: &EtfMetrics) -> FeatureSet {
    FeatureSet {
        expense_ratio: m.expense_ratio,
        liquidity_composite: liquidity_composite(m),
        holdings: m.holdings,
        assets_log: log10_floored(m.assets),
        issuer_score: issuer_score(m.issuer.as_deref()),
        risk_adjusted_return: risk_adjusted_return(m.sharpe_ratio, m.sortino_ratio),
        dividend_yield: m.dividend_yield,
        dividend_stability: dividend_stability(m.dividend_growth_years, m.dividend_growth),
        tracking_efficiency: tracking_efficiency(&m.tracking),
        risk_balance: risk_balance(m),
        intraday_momentum: m.change_1d,
        discount_from_high: m.high_52w_change,
        distance_from_low: m.low_52w_change,
        moving_average_combo: moving_average_combo(m),
        rsi: m.rsi,
        volume_pulse: log1p_floored(m.relative_volume),
        momentum_1m: m.total_return_1m,
        gap_signal: gap_signal(m),
    }
}
