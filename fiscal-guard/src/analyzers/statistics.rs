//! Descriptive statistics over a numeric sample.
//!
//! All dispersion measures are population measures (divide by N). Percentiles
//! use linear interpolation between order statistics at index `p/100 * (n-1)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FiscalError, Result};

/// Percentiles at 10/25/50/75/90.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Percentiles {
    /// Computes the reported percentiles from an ascending, non-empty sample.
    pub(crate) fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p10: percentile_sorted(sorted, 10.0),
            p25: percentile_sorted(sorted, 25.0),
            p50: percentile_sorted(sorted, 50.0),
            p75: percentile_sorted(sorted, 75.0),
            p90: percentile_sorted(sorted, 90.0),
        }
    }

    /// Interquartile range, P75 - P25.
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }
}

/// Descriptive statistics for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStatistics {
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; ties go to the value seen first
    pub mode: f64,
    pub standard_deviation: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub sample_size: usize,
    pub percentiles: Percentiles,
    /// Third standardized moment
    pub skewness: f64,
    /// Fourth standardized moment minus 3
    pub kurtosis: f64,
}

impl DescriptiveStatistics {
    /// Computes statistics for an anonymous sample.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fiscal_guard::analyzers::statistics::DescriptiveStatistics;
    ///
    /// let stats = DescriptiveStatistics::compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(stats.median, 2.5);
    /// assert_eq!(stats.range, 3.0);
    /// ```
    pub fn compute(values: &[f64]) -> Result<Self> {
        Self::compute_for("<sample>", values)
    }

    /// Computes statistics for a named field, failing with `EmptySample`.
    pub fn compute_for(field: &str, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(FiscalError::empty_sample(field));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FiscalError::invalid_data_type(
                field,
                values.iter().position(|v| !v.is_finite()).unwrap_or(0),
                "non-finite value",
            ));
        }

        let n = values.len() as f64;
        let sorted = sorted_copy(values);
        let mean = mean(values);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let standard_deviation = variance.sqrt();

        let (skewness, kurtosis) = if standard_deviation > 0.0 {
            let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
            let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
            (
                m3 / standard_deviation.powi(3),
                m4 / variance.powi(2) - 3.0,
            )
        } else {
            (0.0, 0.0)
        };

        let percentiles = Percentiles::from_sorted(&sorted);
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];

        Ok(Self {
            mean,
            median: percentiles.p50,
            mode: mode(values),
            standard_deviation,
            variance,
            min,
            max,
            range: max - min,
            sample_size: values.len(),
            percentiles,
            skewness,
            kurtosis,
        })
    }

    /// Coefficient of variation in percent; zero when the mean is zero.
    pub fn coefficient_of_variation(&self) -> f64 {
        coefficient_of_variation(self.standard_deviation, self.mean)
    }
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile_sorted(&sorted_copy(values), 50.0))
}

/// Population standard deviation; zero for fewer than two values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Percentile of an unsorted sample; `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(percentile_sorted(&sorted_copy(values), p))
}

/// Percentile of an ascending, non-empty sample with linear interpolation.
///
/// `p` is clamped to [0, 100]. Callers guarantee a non-empty slice;
/// [`percentile`] is the checked entry point.
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 100.0);
    let index = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = index - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Coefficient of variation in percent, guarding against a zero mean.
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        std_dev / mean.abs() * 100.0
    }
}

/// Returns an ascending copy of the sample.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn mode(values: &[f64]) -> f64 {
    // (count, first index) keyed by bit pattern; `+ 0.0` folds -0.0 into 0.0
    let mut counts: HashMap<u64, (usize, usize)> = HashMap::new();
    for (i, v) in values.iter().enumerate() {
        let entry = counts.entry((v + 0.0).to_bits()).or_insert((0, i));
        entry.0 += 1;
    }
    counts
        .values()
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map_or(values[0], |&(_, first)| values[first])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    #[test]
    fn test_percentiles_linear_interpolation() {
        let stats = DescriptiveStatistics::compute(&one_to_ten()).unwrap();
        assert!((stats.median - 5.5).abs() < EPS);
        assert!((stats.percentiles.p25 - 3.25).abs() < EPS);
        assert!((stats.percentiles.p75 - 7.75).abs() < EPS);
        assert!((stats.percentiles.p10 - 1.9).abs() < EPS);
        assert!((stats.percentiles.p90 - 9.1).abs() < EPS);
    }

    #[test]
    fn test_basic_moments() {
        let stats = DescriptiveStatistics::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        assert!((stats.mean - 5.0).abs() < EPS);
        assert!((stats.variance - 4.0).abs() < EPS);
        assert!((stats.standard_deviation - 2.0).abs() < EPS);
        assert_eq!(stats.mode, 4.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.range, 7.0);
        assert_eq!(stats.sample_size, 8);
    }

    #[test]
    fn test_single_value_has_zero_dispersion() {
        let stats = DescriptiveStatistics::compute(&[42.0]).unwrap();
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.percentiles.p90, 42.0);
    }

    #[test]
    fn test_empty_sample_fails() {
        let err = DescriptiveStatistics::compute_for("gdp", &[]).unwrap_err();
        assert!(matches!(err, FiscalError::EmptySample { ref field } if field == "gdp"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(DescriptiveStatistics::compute(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        let stats = DescriptiveStatistics::compute(&[3.0, 1.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.mode, 3.0);

        let all_unique = DescriptiveStatistics::compute(&[9.0, 8.0, 7.0]).unwrap();
        assert_eq!(all_unique.mode, 9.0);
    }

    #[test]
    fn test_skewness_sign() {
        let right = DescriptiveStatistics::compute(&[1.0, 1.0, 1.0, 2.0, 10.0]).unwrap();
        assert!(right.skewness > 0.0);
        let left = DescriptiveStatistics::compute(&[-10.0, -2.0, -1.0, -1.0, -1.0]).unwrap();
        assert!(left.skewness < 0.0);

        let symmetric = DescriptiveStatistics::compute(&[1.0, 2.0, 3.0]).unwrap();
        assert!(symmetric.skewness.abs() < EPS);
    }

    #[test]
    fn test_excess_kurtosis_of_two_point_distribution() {
        // Symmetric two-point distribution has kurtosis 1, excess -2
        let stats = DescriptiveStatistics::compute(&[-1.0, 1.0, -1.0, 1.0]).unwrap();
        assert!((stats.kurtosis + 2.0).abs() < EPS);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        assert_eq!(coefficient_of_variation(3.0, 0.0), 0.0);
        assert!((coefficient_of_variation(2.0, -4.0) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_free_helpers() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(percentile(&[4.0, 1.0], 100.0), Some(4.0));
        assert_eq!(population_std_dev(&[7.0]), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_public_percentile_handles_empty_and_clamps() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[3.0], 10.0), Some(3.0));
        assert_eq!(percentile(&[1.0, 2.0, 3.0], -5.0), Some(1.0));
        assert_eq!(percentile(&[1.0, 2.0, 3.0], 250.0), Some(3.0));
        assert!(DescriptiveStatistics::compute(&[]).is_err());
    }
}
