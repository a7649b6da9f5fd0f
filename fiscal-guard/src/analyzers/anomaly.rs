//! Record-level anomaly identification.
//!
//! Cross-references per-field statistics with outlier lists and grades each
//! flagged value by how far it deviates. Severity bands are configured per
//! outlier method through [`SeverityThresholds`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::outliers::Outlier;
use crate::analyzers::statistics::DescriptiveStatistics;
use crate::config::{OutlierMethod, SeverityThresholds};
use crate::record::Record;

/// Severity of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged value in one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Position of the record in the analysed record set
    pub record_index: usize,
    /// Identifying values of the record (required fields)
    pub record_key: BTreeMap<String, String>,
    pub field: String,
    pub value: f64,
    pub severity: Severity,
    /// Method-specific deviation the severity was derived from
    pub deviation: f64,
    pub reason: String,
}

/// Anomaly counts by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub total_anomalies: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
}

impl AnomalySummary {
    fn record(&mut self, severity: Severity) {
        self.total_anomalies += 1;
        match severity {
            Severity::High => self.high_severity += 1,
            Severity::Medium => self.medium_severity += 1,
            Severity::Low => self.low_severity += 1,
        }
    }
}

/// Anomalies found in a record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    /// Ordered by severity (high first), then record index, then field
    pub anomalies: Vec<Anomaly>,
    pub summary: AnomalySummary,
}

impl AnomalyReport {
    /// Anomalies at or above the given severity.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.iter().filter(move |a| a.severity >= severity)
    }

    /// Anomalies for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Anomaly> + 'a {
        self.anomalies.iter().filter(move |a| a.field == field)
    }
}

/// Grades outliers into anomalies.
#[derive(Debug, Clone)]
pub struct AnomalyIdentifier {
    method: OutlierMethod,
    thresholds: SeverityThresholds,
    key_fields: Vec<String>,
}

impl AnomalyIdentifier {
    /// Creates an identifier for outliers produced by `method`.
    pub fn new(method: OutlierMethod) -> Self {
        Self {
            method,
            thresholds: SeverityThresholds::default(),
            key_fields: Vec::new(),
        }
    }

    /// Sets the severity multipliers.
    pub fn with_thresholds(mut self, thresholds: SeverityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the fields copied into each anomaly's record key.
    pub fn with_key_fields(mut self, fields: Vec<String>) -> Self {
        self.key_fields = fields;
        self
    }

    /// Grades a deviation with this identifier's bands.
    pub fn classify(&self, deviation: f64) -> Severity {
        let bands = self.thresholds.for_method(self.method);
        if deviation >= bands.high {
            Severity::High
        } else if deviation >= bands.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Builds the anomaly report.
    ///
    /// `outliers` maps field names to outliers whose `index` is a record
    /// position in `records` (see `detect_record_outliers`).
    #[instrument(skip_all, fields(method = %self.method, fields = outliers.len()))]
    pub fn identify(
        &self,
        records: &[Record],
        statistics: &BTreeMap<String, DescriptiveStatistics>,
        outliers: &BTreeMap<String, Vec<Outlier>>,
    ) -> AnomalyReport {
        let mut report = AnomalyReport::default();

        for (field, flagged) in outliers {
            let stats = statistics.get(field);
            for outlier in flagged {
                let severity = self.classify(outlier.deviation);
                report.summary.record(severity);
                report.anomalies.push(Anomaly {
                    record_index: outlier.index,
                    record_key: records
                        .get(outlier.index)
                        .map(|r| r.identity(&self.key_fields))
                        .unwrap_or_default(),
                    field: field.clone(),
                    value: outlier.value,
                    severity,
                    deviation: outlier.deviation,
                    reason: self.reason(outlier, stats),
                });
            }
        }

        report.anomalies.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.record_index.cmp(&b.record_index))
                .then_with(|| a.field.cmp(&b.field))
        });

        debug!(
            total = report.summary.total_anomalies,
            high = report.summary.high_severity,
            "Anomaly identification complete"
        );
        report
    }

    fn reason(&self, outlier: &Outlier, stats: Option<&DescriptiveStatistics>) -> String {
        let measure = match self.method {
            OutlierMethod::Iqr => format!(
                "{:.2}x IQR beyond the {} quartile",
                outlier.deviation,
                match stats {
                    Some(s) if outlier.value < s.median => "lower",
                    _ => "upper",
                }
            ),
            OutlierMethod::ZScore => format!("z-score of {:.2}", outlier.deviation),
            OutlierMethod::ModifiedZScore => {
                format!("modified z-score of {:.2}", outlier.deviation)
            }
        };
        match stats {
            Some(s) => format!(
                "value {} lies {} (median {}, mean {})",
                compact(outlier.value),
                measure,
                compact(s.median),
                compact(s.mean)
            ),
            None => format!("value {} lies {}", compact(outlier.value), measure),
        }
    }
}

/// Counts anomalies per field, for reporting.
pub fn anomalies_per_field(report: &AnomalyReport) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for anomaly in &report.anomalies {
        *counts.entry(anomaly.field.clone()).or_insert(0) += 1;
    }
    counts
}

fn compact(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::outliers::detect_record_outliers;

    fn records(values: &[f64]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Record::new()
                    .with("country", format!("C{i}"))
                    .with("spending", *v)
            })
            .collect()
    }

    fn outlier(index: usize, value: f64, deviation: f64) -> Outlier {
        Outlier {
            value,
            index,
            deviation,
        }
    }

    #[test]
    fn test_iqr_severity_bands() {
        let identifier = AnomalyIdentifier::new(OutlierMethod::Iqr);
        assert_eq!(identifier.classify(1.6), Severity::Low);
        assert_eq!(identifier.classify(2.0), Severity::Medium);
        assert_eq!(identifier.classify(2.9), Severity::Medium);
        assert_eq!(identifier.classify(3.0), Severity::High);
    }

    #[test]
    fn test_zscore_bands_are_scaled() {
        let identifier = AnomalyIdentifier::new(OutlierMethod::ZScore);
        assert_eq!(identifier.classify(3.5), Severity::Low);
        assert_eq!(identifier.classify(4.5), Severity::Medium);
        assert_eq!(identifier.classify(6.5), Severity::High);
    }

    #[test]
    fn test_identify_orders_and_summarises() {
        let data = records(&[1.0, 2.0, 3.0, 4.0]);
        let mut outliers = BTreeMap::new();
        outliers.insert(
            "spending".to_string(),
            vec![outlier(0, 1.0, 1.7), outlier(3, 4.0, 12.0), outlier(2, 3.0, 2.2)],
        );

        let report = AnomalyIdentifier::new(OutlierMethod::Iqr)
            .with_key_fields(vec!["country".to_string()])
            .identify(&data, &BTreeMap::new(), &outliers);

        assert_eq!(report.summary.total_anomalies, 3);
        assert_eq!(report.summary.high_severity, 1);
        assert_eq!(report.summary.medium_severity, 1);
        assert_eq!(report.summary.low_severity, 1);
        assert_eq!(report.anomalies[0].record_index, 3);
        assert_eq!(report.anomalies[0].severity, Severity::High);
        assert_eq!(
            report.anomalies[0].record_key.get("country").map(String::as_str),
            Some("C3")
        );
        assert_eq!(report.at_least(Severity::Medium).count(), 2);
        assert_eq!(report.for_field("spending").count(), 3);
        assert_eq!(anomalies_per_field(&report).get("spending"), Some(&3));
    }

    #[test]
    fn test_reason_mentions_statistics() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let data = records(&values);
        let mut statistics = BTreeMap::new();
        statistics.insert(
            "spending".to_string(),
            DescriptiveStatistics::compute(&values).unwrap(),
        );
        let mut outliers = BTreeMap::new();
        outliers.insert(
            "spending".to_string(),
            detect_record_outliers(&data, "spending", OutlierMethod::Iqr),
        );

        let report =
            AnomalyIdentifier::new(OutlierMethod::Iqr).identify(&data, &statistics, &outliers);
        assert_eq!(report.anomalies.len(), 1);
        let anomaly = &report.anomalies[0];
        assert_eq!(anomaly.severity, Severity::High);
        assert!(anomaly.reason.contains("upper quartile"));
        assert!(anomaly.reason.contains("median 5.50"));
    }

    #[test]
    fn test_no_outliers_no_anomalies() {
        let report = AnomalyIdentifier::new(OutlierMethod::ModifiedZScore).identify(
            &records(&[1.0]),
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        assert!(report.anomalies.is_empty());
        assert_eq!(report.summary, AnomalySummary::default());
    }
}
