//! ETF scoring pipeline
//!
//! Raw screener metrics -> per-ETF features -> cross-sectional 0-100
//! normalization -> weighted fundamentals/opportunity sub-scores -> blended
//! final score, sorted best first.

pub mod features;
pub mod metrics;
pub mod normalize;
pub mod policy;
pub mod scorer;
pub mod stats;
pub mod validation;


pub use features::{extract_features, issuer_score, DEFAULT_ISSUER_SCORE};
pub use metrics::{first_present, EtfMetrics};
pub use normalize::{NormalizedFeatures, ScaledFeature};
pub use policy::{ScoringPolicy, ValueTrapGuard, WeightTable};
pub use scorer::{build_etf_entries, score_etfs, EtfScorer};
pub use stats::{mean, min_max_scale, safe_number, winsorize, NEUTRAL_SCORE};
pub use validation::{find_empty_indicators, validation_indicators, Indicator};
