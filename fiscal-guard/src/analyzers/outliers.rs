//! Outlier detection with interchangeable methods.
//!
//! Each flagged value carries a method-specific `deviation`, later used to
//! grade anomaly severity:
//!
//! | Method | Flagged when | Deviation |
//! |---|---|---|
//! | IQR | outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` | distance from the nearer quartile in IQRs |
//! | Z-score | `abs(z) > 3` | `abs(z)` |
//! | Modified Z-score | `abs(0.6745 (x - median) / MAD) > 3.5` | `abs(modified z)` |
//!
//! A zero scale (IQR, standard deviation or MAD) flags nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::statistics::{mean, median, percentile_sorted, sorted_copy};
use crate::config::OutlierMethod;
use crate::record::{indexed_sample, Record};

/// Tukey fence multiplier.
pub const IQR_MULTIPLIER: f64 = 1.5;
/// Z-score cut-off.
pub const ZSCORE_THRESHOLD: f64 = 3.0;
/// Modified z-score cut-off.
pub const MODIFIED_ZSCORE_THRESHOLD: f64 = 3.5;
/// Consistency constant relating MAD to the standard deviation of a normal.
pub const MAD_SCALE: f64 = 0.6745;

/// A value flagged as an outlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// The flagged value
    pub value: f64,
    /// Position of the value in the input sample
    pub index: usize,
    /// Method-specific magnitude of the deviation
    pub deviation: f64,
}

/// Bounds an outlier method derived from a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierBounds {
    pub method: OutlierMethod,
    /// Values below this are flagged
    pub lower: f64,
    /// Values above this are flagged
    pub upper: f64,
    /// Point low-side deviations are measured from (Q1 for IQR)
    pub lower_anchor: f64,
    /// Point high-side deviations are measured from (Q3 for IQR)
    pub upper_anchor: f64,
    /// Centre of the sample (median for IQR/modified z, mean for z)
    pub center: f64,
    /// Scale used for the deviation (IQR, std dev or MAD)
    pub scale: f64,
}

/// Outlier detector bound to one method.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierDetector {
    method: OutlierMethod,
}

impl OutlierDetector {
    /// Creates a detector for the given method.
    pub fn new(method: OutlierMethod) -> Self {
        Self { method }
    }

    /// Returns the configured method.
    pub fn method(&self) -> OutlierMethod {
        self.method
    }

    /// Derives the detection bounds; `None` when the sample is empty or has zero scale.
    pub fn bounds(&self, values: &[f64]) -> Option<OutlierBounds> {
        if values.is_empty() {
            return None;
        }
        match self.method {
            OutlierMethod::Iqr => {
                let sorted = sorted_copy(values);
                let q1 = percentile_sorted(&sorted, 25.0);
                let q3 = percentile_sorted(&sorted, 75.0);
                let iqr = q3 - q1;
                (iqr > 0.0).then(|| OutlierBounds {
                    method: self.method,
                    lower: q1 - IQR_MULTIPLIER * iqr,
                    upper: q3 + IQR_MULTIPLIER * iqr,
                    lower_anchor: q1,
                    upper_anchor: q3,
                    center: percentile_sorted(&sorted, 50.0),
                    scale: iqr,
                })
            }
            OutlierMethod::ZScore => {
                let m = mean(values);
                let std_dev = (values.iter().map(|v| (v - m).powi(2)).sum::<f64>()
                    / values.len() as f64)
                    .sqrt();
                (std_dev > 0.0).then(|| OutlierBounds {
                    method: self.method,
                    lower: m - ZSCORE_THRESHOLD * std_dev,
                    upper: m + ZSCORE_THRESHOLD * std_dev,
                    lower_anchor: m,
                    upper_anchor: m,
                    center: m,
                    scale: std_dev,
                })
            }
            OutlierMethod::ModifiedZScore => {
                let med = median(values)?;
                let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
                let mad = median(&deviations)?;
                let reach = MODIFIED_ZSCORE_THRESHOLD * mad / MAD_SCALE;
                (mad > 0.0).then(|| OutlierBounds {
                    method: self.method,
                    lower: med - reach,
                    upper: med + reach,
                    lower_anchor: med,
                    upper_anchor: med,
                    center: med,
                    scale: mad,
                })
            }
        }
    }

    /// Flags outliers in the sample, in input order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fiscal_guard::analyzers::outliers::OutlierDetector;
    /// use fiscal_guard::config::OutlierMethod;
    ///
    /// let sample = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
    /// let outliers = OutlierDetector::new(OutlierMethod::Iqr).detect(&sample);
    /// assert_eq!(outliers.len(), 1);
    /// assert_eq!(outliers[0].index, 9);
    /// ```
    #[instrument(skip(self, values), fields(method = %self.method, sample_size = values.len()))]
    pub fn detect(&self, values: &[f64]) -> Vec<Outlier> {
        let Some(bounds) = self.bounds(values) else {
            debug!("No usable scale, nothing flagged");
            return Vec::new();
        };

        let outliers: Vec<Outlier> = values
            .iter()
            .enumerate()
            .filter_map(|(index, &value)| {
                self.deviation(value, &bounds)
                    .map(|deviation| Outlier {
                        value,
                        index,
                        deviation,
                    })
            })
            .collect();

        debug!(flagged = outliers.len(), "Outlier detection complete");
        outliers
    }

    fn deviation(&self, value: f64, bounds: &OutlierBounds) -> Option<f64> {
        match self.method {
            OutlierMethod::Iqr => {
                if value < bounds.lower {
                    Some((bounds.lower_anchor - value) / bounds.scale)
                } else if value > bounds.upper {
                    Some((value - bounds.upper_anchor) / bounds.scale)
                } else {
                    None
                }
            }
            OutlierMethod::ZScore => {
                let z = ((value - bounds.center) / bounds.scale).abs();
                (z > ZSCORE_THRESHOLD).then_some(z)
            }
            OutlierMethod::ModifiedZScore => {
                let mz = (MAD_SCALE * (value - bounds.center) / bounds.scale).abs();
                (mz > MODIFIED_ZSCORE_THRESHOLD).then_some(mz)
            }
        }
    }
}

/// Convenience wrapper around [`OutlierDetector::detect`].
pub fn detect_outliers(values: &[f64], method: OutlierMethod) -> Vec<Outlier> {
    OutlierDetector::new(method).detect(values)
}

/// Flags outliers in one field of a record set.
///
/// Missing and invalid values are skipped; the returned `index` is the
/// position of the record, not of the value within the sample.
pub fn detect_record_outliers(
    records: &[Record],
    field: &str,
    method: OutlierMethod,
) -> Vec<Outlier> {
    let sample = indexed_sample(records, field);
    let values: Vec<f64> = sample.iter().map(|(_, v)| *v).collect();
    detect_outliers(&values, method)
        .into_iter()
        .map(|outlier| Outlier {
            index: sample[outlier.index].0,
            ..outlier
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn with_spike() -> Vec<f64> {
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]
    }

    #[test]
    fn test_iqr_boundary() {
        let detector = OutlierDetector::new(OutlierMethod::Iqr);
        let bounds = detector.bounds(&with_spike()).unwrap();
        assert!((bounds.scale - 4.5).abs() < EPS);
        assert!((bounds.upper - 14.5).abs() < EPS);
        assert!((bounds.lower + 3.5).abs() < EPS);

        let outliers = detector.detect(&with_spike());
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].value, 100.0);
        assert_eq!(outliers[0].index, 9);
        // (100 - 7.75) / 4.5
        assert!((outliers[0].deviation - 20.5).abs() < EPS);
    }

    #[test]
    fn test_iqr_low_side() {
        let mut sample = with_spike();
        sample[9] = -100.0;
        let outliers = detect_outliers(&sample, OutlierMethod::Iqr);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].value, -100.0);
        assert!(outliers[0].deviation > IQR_MULTIPLIER);
    }

    #[test]
    fn test_zscore_needs_large_sample() {
        // With 10 points max |z| is (n-1)/sqrt(n) < 3, so nothing is flagged
        assert!(detect_outliers(&with_spike(), OutlierMethod::ZScore).is_empty());

        let mut sample: Vec<f64> = (0..30).map(|i| f64::from(i % 5)).collect();
        sample.push(500.0);
        let outliers = detect_outliers(&sample, OutlierMethod::ZScore);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].index, 30);
        assert!(outliers[0].deviation > ZSCORE_THRESHOLD);
    }

    #[test]
    fn test_modified_zscore() {
        let outliers = detect_outliers(&with_spike(), OutlierMethod::ModifiedZScore);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].value, 100.0);
        // median 5.5, MAD 2.5
        let expected = MAD_SCALE * (100.0 - 5.5) / 2.5;
        assert!((outliers[0].deviation - expected).abs() < EPS);
    }

    #[test]
    fn test_zero_scale_flags_nothing() {
        let flat = vec![5.0; 12];
        for method in [
            OutlierMethod::Iqr,
            OutlierMethod::ZScore,
            OutlierMethod::ModifiedZScore,
        ] {
            assert!(detect_outliers(&flat, method).is_empty());
        }

        // MAD is zero even though one value differs
        let mostly_flat = vec![1.0, 1.0, 1.0, 1.0, 50.0];
        assert!(detect_outliers(&mostly_flat, OutlierMethod::ModifiedZScore).is_empty());
    }

    #[test]
    fn test_record_outliers_use_record_positions() {
        let mut records: Vec<Record> = with_spike()
            .into_iter()
            .map(|v| Record::new().with("spending", v))
            .collect();
        records.insert(0, Record::new().with("spending", "n/a"));
        records.insert(3, Record::new().with("country", "FRA"));

        let outliers = detect_record_outliers(&records, "spending", OutlierMethod::Iqr);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].index, 11);
        assert_eq!(outliers[0].value, 100.0);
    }

    #[test]
    fn test_empty_sample() {
        assert!(detect_outliers(&[], OutlierMethod::Iqr).is_empty());
        assert!(OutlierDetector::default().bounds(&[]).is_none());
    }
}
