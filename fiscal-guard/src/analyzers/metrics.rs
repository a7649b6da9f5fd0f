//! Volatility, trend and anomaly-score metrics per numeric field.
//!
//! When records carry a time dimension (a `year` field by default, matched
//! ignoring case) volatility is measured over the per-year means in year
//! order and the trend is a least-squares fit of value on year. Without one,
//! volatility falls back to the raw values and no trend is fitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::correlation::{correlation_matrix, CorrelationPair};
use crate::analyzers::outliers::Outlier;
use crate::analyzers::statistics::{coefficient_of_variation, mean, population_std_dev};
use crate::record::Record;

/// Least-squares fit of value against time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearTrend {
    /// Change in value per time unit
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in [0, 1]
    pub r_squared: f64,
    /// Points the fit was computed from
    pub points: usize,
}

impl LinearTrend {
    /// Fits `y = slope * x + intercept`.
    ///
    /// Returns `None` for fewer than two points or zero variance in `x`.
    /// Zero variance in `y` yields a flat fit with `r_squared` of zero.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (x, y) in points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        if sxx <= 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let r_squared = if syy > 0.0 {
            (sxy * sxy / (sxx * syy)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
            r_squared,
            points: points.len(),
        })
    }
}

/// Metrics for one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetrics {
    /// Coefficient of variation in percent
    pub volatility: f64,
    /// R² of the time trend, as a percentage in [0, 100]
    pub trend_strength: f64,
    /// Fitted trend, when a time dimension allows one
    pub trend: Option<LinearTrend>,
    /// Share of the field's values flagged as outliers, in percent
    pub anomaly_score: f64,
    /// Valid values the metrics were computed from
    pub sample_size: usize,
}

/// Metrics across all numeric fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedMetrics {
    pub field_metrics: BTreeMap<String, FieldMetrics>,
    pub correlations: Vec<CorrelationPair>,
}

impl AdvancedMetrics {
    /// Correlation pair for two fields in either order.
    pub fn correlation(&self, a: &str, b: &str) -> Option<&CorrelationPair> {
        self.correlations.iter().find(|p| {
            (p.field_a == a && p.field_b == b) || (p.field_a == b && p.field_b == a)
        })
    }
}

/// Computes [`AdvancedMetrics`] for a record set.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    time_field: String,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new("year")
    }
}

impl MetricsCalculator {
    /// Creates a calculator using `time_field` as the time dimension.
    pub fn new(time_field: impl Into<String>) -> Self {
        Self {
            time_field: time_field.into(),
        }
    }

    /// Computes metrics for every field in `fields`.
    ///
    /// `outliers` holds the flagged values per field; fields without an
    /// entry score zero.
    #[instrument(skip_all, fields(records = records.len(), fields = fields.len()))]
    pub fn compute(
        &self,
        records: &[Record],
        fields: &[String],
        outliers: &BTreeMap<String, Vec<Outlier>>,
    ) -> AdvancedMetrics {
        let field_metrics = fields
            .iter()
            .map(|field| {
                let flagged = outliers.get(field).map_or(0, Vec::len);
                (field.clone(), self.field_metrics(records, field, flagged))
            })
            .collect();

        let metrics = AdvancedMetrics {
            field_metrics,
            correlations: correlation_matrix(records, fields),
        };
        debug!(
            correlations = metrics.correlations.len(),
            "Advanced metrics complete"
        );
        metrics
    }

    /// Metrics for one field; `flagged` is the number of outliers found in it.
    pub fn field_metrics(&self, records: &[Record], field: &str, flagged: usize) -> FieldMetrics {
        let mut values = Vec::new();
        let mut timed = Vec::new();
        for record in records {
            let Some(value) = record.numeric(field).as_f64() else {
                continue;
            };
            values.push(value);
            if let Some(time) = self.time_of(record) {
                timed.push((time, value));
            }
        }

        let volatility = if timed.is_empty() {
            coefficient_of_variation(population_std_dev(&values), mean(&values))
        } else {
            let per_period = period_means(&timed);
            coefficient_of_variation(population_std_dev(&per_period), mean(&per_period))
        };

        let trend = LinearTrend::fit(&timed);
        let trend_strength = trend
            .as_ref()
            .map_or(0.0, |t| (t.r_squared * 100.0).clamp(0.0, 100.0));

        let anomaly_score = if values.is_empty() {
            0.0
        } else {
            (flagged as f64 / values.len() as f64 * 100.0).min(100.0)
        };

        FieldMetrics {
            volatility,
            trend_strength,
            trend,
            anomaly_score,
            sample_size: values.len(),
        }
    }

    fn time_of(&self, record: &Record) -> Option<f64> {
        record
            .get_ignore_case(&self.time_field)
            .and_then(|(_, v)| v.to_numeric().as_f64())
    }
}

/// Means per time period, in ascending period order.
fn period_means(timed: &[(f64, f64)]) -> Vec<f64> {
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (time, value) in timed {
        let entry = groups.entry(time.round() as i64).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    groups
        .values()
        .map(|(sum, count)| sum / *count as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn yearly(values: &[(i32, f64)]) -> Vec<Record> {
        values
            .iter()
            .map(|(year, v)| Record::new().with("Year", *year).with("gdp", *v))
            .collect()
    }

    #[test]
    fn test_perfect_linear_trend() {
        let records = yearly(&[(2019, 100.0), (2020, 110.0), (2021, 120.0), (2022, 130.0)]);
        let metrics = MetricsCalculator::default().field_metrics(&records, "gdp", 0);
        let trend = metrics.trend.unwrap();
        assert!((trend.slope - 10.0).abs() < EPS);
        assert!((trend.r_squared - 1.0).abs() < EPS);
        assert!((metrics.trend_strength - 100.0).abs() < EPS);
        assert_eq!(metrics.anomaly_score, 0.0);
    }

    #[test]
    fn test_volatility_uses_per_year_means() {
        // Two countries per year; yearly means are 10 and 30
        let records = yearly(&[(2020, 5.0), (2020, 15.0), (2021, 25.0), (2021, 35.0)]);
        let metrics = MetricsCalculator::default().field_metrics(&records, "gdp", 0);
        // std of [10, 30] = 10, mean 20
        assert!((metrics.volatility - 50.0).abs() < EPS);
    }

    #[test]
    fn test_volatility_without_time_field() {
        let records: Vec<Record> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|v| Record::new().with("gdp", *v))
            .collect();
        let metrics = MetricsCalculator::default().field_metrics(&records, "gdp", 2);
        assert!((metrics.volatility - 40.0).abs() < EPS);
        assert!(metrics.trend.is_none());
        assert_eq!(metrics.trend_strength, 0.0);
        assert!((metrics.anomaly_score - 25.0).abs() < EPS);
    }

    #[test]
    fn test_zero_mean_volatility_is_zero() {
        let records = yearly(&[(2020, -5.0), (2021, 5.0)]);
        let metrics = MetricsCalculator::default().field_metrics(&records, "gdp", 0);
        assert_eq!(metrics.volatility, 0.0);
        assert!(metrics.volatility.is_finite());
    }

    #[test]
    fn test_degenerate_trends() {
        assert!(LinearTrend::fit(&[(2020.0, 1.0)]).is_none());
        assert!(LinearTrend::fit(&[(2020.0, 1.0), (2020.0, 5.0)]).is_none());
        let flat = LinearTrend::fit(&[(2020.0, 3.0), (2021.0, 3.0)]).unwrap();
        assert_eq!(flat.r_squared, 0.0);
        assert_eq!(flat.slope, 0.0);
    }

    #[test]
    fn test_compute_includes_correlations() {
        let records: Vec<Record> = (0..5)
            .map(|i| {
                Record::new()
                    .with("year", 2018 + i)
                    .with("spending", f64::from(i) * 2.0 + 1.0)
                    .with("gdp", f64::from(i) * 10.0 + 3.0)
            })
            .collect();
        let fields = vec!["spending".to_string(), "gdp".to_string()];
        let mut outliers = BTreeMap::new();
        outliers.insert("gdp".to_string(), Vec::new());

        let metrics = MetricsCalculator::default().compute(&records, &fields, &outliers);
        assert_eq!(metrics.field_metrics.len(), 2);
        let pair = metrics.correlation("gdp", "spending").unwrap();
        assert!((pair.coefficient - 1.0).abs() < EPS);
        assert_eq!(metrics.field_metrics["spending"].sample_size, 5);
    }
}
