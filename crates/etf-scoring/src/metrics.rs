//! Typed view over the provider's raw field bag.
//!
//! Every field the scorer reads is resolved here once, so the feature
//! extractor never does string-keyed lookups.

use ranking_core::RawMetrics;

/// Tracking-quality fields, any subset of which may be reported.
const TRACKING_FIELDS: [&str; 5] = [
    "trackingDifference",
    "trackingError",
    "trackingError1y",
    "trackingError3y",
    "trackingError5y",
];

/// First value that is present, in the order given.
pub fn first_present<T, I>(candidates: I) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    candidates.into_iter().flatten().next()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EtfMetrics {
    pub issuer: Option<String>,

    // Cost and size
    pub expense_ratio: Option<f64>,
    pub holdings: Option<f64>,
    pub assets: Option<f64>,

    // Liquidity
    pub dollar_volume: Option<f64>,
    pub volume: Option<f64>,
    pub relative_volume: Option<f64>,

    // Risk/return
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub beta: Option<f64>,
    pub atr: Option<f64>,
    pub tracking: Vec<f64>,

    // Income
    pub dividend_yield: Option<f64>,
    pub dividend_growth: Option<f64>,
    pub dividend_growth_years: Option<f64>,

    // Prices
    pub close: Option<f64>,
    pub open: Option<f64>,
    pub pre_close: Option<f64>,

    // Timing
    pub change_1d: Option<f64>,
    pub total_return_1m: Option<f64>,
    pub high_52w_change: Option<f64>,
    pub low_52w_change: Option<f64>,
    pub ma20_change: Option<f64>,
    pub ma50_change: Option<f64>,
    pub ma150_change: Option<f64>,
    pub ma200_change: Option<f64>,
    pub rsi: Option<f64>,
    pub premarket_change_percent: Option<f64>,
    pub after_hours_change_percent: Option<f64>,
}

impl EtfMetrics {
    pub fn from_raw(raw: &RawMetrics) -> Self {
        Self {
            issuer: raw.text("issuer").map(str::to_string),

            expense_ratio: raw.number("expenseRatio"),
            holdings: first_present([raw.number("holdings"), raw.number("holdingsCount")]),
            assets: raw.number("assets"),

            dollar_volume: raw.number("dollarVolume"),
            volume: raw.number("volume"),
            relative_volume: raw.number("relativeVolume"),

            sharpe_ratio: raw.number("sharpeRatio"),
            sortino_ratio: raw.number("sortinoRatio"),
            beta: raw.number("beta"),
            atr: raw.number("atr"),
            tracking: TRACKING_FIELDS.iter().filter_map(|k| raw.number(k)).collect(),

            dividend_yield: raw.number("dividendYield"),
            dividend_growth: raw.number("dividendGrowth"),
            dividend_growth_years: raw.number("dividendGrowthYears"),

            close: raw.number("close"),
            open: raw.number("open"),
            pre_close: raw.number("preClose"),

            change_1d: raw.number("ch1d"),
            total_return_1m: raw.number("tr1m"),
            high_52w_change: raw.number("high52ch"),
            low_52w_change: raw.number("low52ch"),
            ma20_change: raw.number("ma20ch"),
            ma50_change: raw.number("ma50ch"),
            ma150_change: raw.number("ma150ch"),
            ma200_change: raw.number("ma200ch"),
            rsi: raw.number("rsi"),
            premarket_change_percent: raw.number("premarketChangePercent"),
            after_hours_change_percent: first_present([
                raw.number("afterHoursChangePercent"),
                raw.number("postmarketChangePercent"),
            ]),
        }
    }

    /// First positive price among close, open and previous close
    pub fn reference_price(&self) -> Option<f64> {
        [self.close, self.open, self.pre_close]
            .into_iter()
            .flatten()
            .find(|p| *p > 0.0)
    }
}
