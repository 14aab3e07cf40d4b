//! Numeric helpers shared by the feature extractor and the normalizer.

use ranking_core::MetricValue;

/// Score assigned when a feature is unavailable or carries no spread.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Below this many samples the tails are not trimmed.
const MIN_WINSORIZE_SAMPLES: usize = 6;

/// Finite number, or a string parsing to one; anything else yields `fallback`.
pub fn safe_number(value: &MetricValue, fallback: f64) -> f64 {
    value.as_f64().unwrap_or(fallback)
}

/// Mean of the finite values. Returns 0.0 when none are present, so callers
/// that need to tell "no data" apart should use [`mean_of_present`].
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean_of_present(values).unwrap_or(0.0)
}

/// Mean of the finite values, `None` when there are none.
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Clamp every value into the `[lower, upper]` percentile band of the sample.
///
/// Percentile positions are `floor(lower/100 * (n-1))` and
/// `ceil(upper/100 * (n-1))` of the ascending sort. Output keeps input order.
/// Samples smaller than six are returned unchanged.
pub fn winsorize(values: &[f64], lower_percentile: f64, upper_percentile: f64) -> Vec<f64> {
    if values.len() < MIN_WINSORIZE_SAMPLES {
        return values.to_vec();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let last = sorted.len() - 1;
    let lower_index = ((lower_percentile / 100.0) * last as f64).floor() as usize;
    let upper_index = ((upper_percentile / 100.0) * last as f64).ceil() as usize;
    let lower_value = sorted[lower_index.min(last)];
    let upper_value = sorted[upper_index.min(last)];

    values
        .iter()
        .map(|&v| {
            if v < lower_value {
                lower_value
            } else if v > upper_value {
                upper_value
            } else {
                v
            }
        })
        .collect()
}

/// Linear rescale onto 0-100. A sample with no spread maps every element to
/// `neutral_value` instead of dividing by zero.
pub fn min_max_scale(values: &[f64], neutral_value: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![neutral_value; values.len()];
    }

    values
        .iter()
        .map(|v| (v - min) / (max - min) * 100.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_number() {
        assert_eq!(safe_number(&MetricValue::Number(3.5), 0.0), 3.5);
        assert_eq!(safe_number(&MetricValue::Text("0.12".to_string()), 0.0), 0.12);
        assert_eq!(safe_number(&MetricValue::Text("abc".to_string()), 7.0), 7.0);
        assert_eq!(safe_number(&MetricValue::Text(String::new()), 7.0), 7.0);
        assert_eq!(safe_number(&MetricValue::Null, -1.0), -1.0);
        assert_eq!(safe_number(&MetricValue::Number(f64::INFINITY), 2.0), 2.0);
    }

    #[test]
    fn test_mean_skips_missing_and_non_finite() {
        let m = mean([Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        assert!((m - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_nothing_is_zero() {
        assert_eq!(mean(Vec::<Option<f64>>::new()), 0.0);
        assert_eq!(mean([None, None]), 0.0);
        assert_eq!(mean_of_present([None, None]), None);
    }

    #[test]
    fn test_winsorize_small_sample_is_identity() {
        let values = vec![100.0, -50.0, 3.0, 0.0, 7.0];
        assert_eq!(winsorize(&values, 2.0, 98.0), values);
        assert!(winsorize(&[], 2.0, 98.0).is_empty());
    }

    #[test]
    fn test_winsorize_clamps_to_percentile_bounds() {
        // n = 11 -> lower index floor(0.1 * 10) = 1, upper index ceil(0.9 * 10) = 9
        let values = vec![50.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, -40.0];
        let result = winsorize(&values, 10.0, 90.0);

        assert_eq!(result.len(), values.len());
        assert_eq!(result[0], 9.0);
        assert_eq!(result[10], 1.0);
        assert_eq!(&result[1..10], &values[1..10]);
    }

    #[test]
    fn test_winsorize_output_within_bounds() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 37) % 23) as f64 - 11.0).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let last = (sorted.len() - 1) as f64;
        let lo = sorted[(0.02 * last).floor() as usize];
        let hi = sorted[(0.98 * last).ceil() as usize];

        for v in winsorize(&values, 2.0, 98.0) {
            assert!(v >= lo && v <= hi);
        }
    }

    #[test]
    fn test_min_max_scale_range() {
        let scaled = min_max_scale(&[10.0, 20.0, 15.0], NEUTRAL_SCORE);
        assert_eq!(scaled, vec![0.0, 100.0, 50.0]);
    }

    #[test]
    fn test_min_max_scale_constant_input_is_neutral() {
        let scaled = min_max_scale(&[4.2, 4.2, 4.2], NEUTRAL_SCORE);
        assert_eq!(scaled, vec![50.0, 50.0, 50.0]);
        assert!(scaled.iter().all(|v| v.is_finite()));

        let custom = min_max_scale(&[1.0], 30.0);
        assert_eq!(custom, vec![30.0]);
    }
}
