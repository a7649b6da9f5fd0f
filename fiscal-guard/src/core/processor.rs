//! The processing orchestrator.
//!
//! [`DataProcessor::process_data`] runs cleaning, statistics, quality
//! assessment, anomaly identification and advanced metrics in sequence and
//! appends a run entry to the processor's own history. Processors are
//! independent of each other; one processor may be shared across threads.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::analyzers::anomaly::{AnomalyIdentifier, AnomalyReport};
use crate::analyzers::inference::TypeInferenceEngine;
use crate::analyzers::metrics::{AdvancedMetrics, MetricsCalculator};
use crate::analyzers::outliers::detect_record_outliers;
use crate::analyzers::statistics::DescriptiveStatistics;
use crate::config::{OutlierMethod, ProcessingOptions, QualityThresholds};
use crate::core::cleaner::{CleaningReport, DataCleaner};
use crate::core::history::{ProcessingHistory, ProcessingHistoryEntry, ProcessingReport};
use crate::core::quality::{QualityAssessment, QualityAssessor, QualityDimension};
use crate::error::{FiscalError, Result};
use crate::log_stage;
use crate::logging::LogConfig;
use crate::record::{numeric_sample, Record};

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    /// Wall-clock time of the processing stages in milliseconds
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
    pub input_count: usize,
    pub output_count: usize,
    /// Numeric fields processed, given or inferred
    pub numeric_fields: Vec<String>,
    pub outlier_method: OutlierMethod,
}

/// Everything one `process_data` call produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub processed_data: Vec<Record>,
    pub cleaning_report: CleaningReport,
    pub quality_assessment: QualityAssessment,
    pub statistical_analysis: BTreeMap<String, DescriptiveStatistics>,
    pub anomalies: AnomalyReport,
    pub advanced_metrics: AdvancedMetrics,
    pub processing_metadata: ProcessingMetadata,
}

impl ProcessingResult {
    /// Serializes the result to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A score compared against its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    /// Dimension name, or `overall`
    pub dimension: String,
    pub score: f64,
    pub threshold: f64,
    pub message: String,
}

/// Outcome of [`DataProcessor::validate_quality`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityValidation {
    pub passed: bool,
    pub failures: Vec<QualityIssue>,
    pub warnings: Vec<QualityIssue>,
}

/// Orchestrates the processing stages and keeps a run history.
///
/// # Examples
///
/// ```rust
/// use fiscal_guard::config::ProcessingOptions;
/// use fiscal_guard::core::processor::DataProcessor;
/// use fiscal_guard::record::Record;
///
/// let records: Vec<Record> = (0..4)
///     .map(|i| {
///         Record::new()
///             .with("country", "FRA")
///             .with("year", 2019 + i)
///             .with("totalSpending", 1000.0 + f64::from(i) * 10.0)
///     })
///     .collect();
///
/// let processor = DataProcessor::new();
/// let options = ProcessingOptions::new()
///     .with_required_fields(["country", "year"])
///     .with_numeric_fields(["totalSpending"]);
/// let result = processor.process_data(&records, &options).unwrap();
///
/// assert_eq!(result.cleaning_report.cleaned_count, 4);
/// assert_eq!(result.statistical_analysis["totalSpending"].mean, 1015.0);
/// assert_eq!(processor.generate_processing_report().total_processing_runs, 1);
/// ```
#[derive(Debug, Default)]
pub struct DataProcessor {
    history: ProcessingHistory,
    log_config: LogConfig,
}

impl DataProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor with the given logging configuration.
    pub fn with_log_config(log_config: LogConfig) -> Self {
        Self {
            history: ProcessingHistory::new(),
            log_config,
        }
    }

    /// Returns the run history.
    pub fn history(&self) -> &ProcessingHistory {
        &self.history
    }

    /// Processes a record set.
    ///
    /// When `options.numeric_fields` is empty, fields inferred as numeric
    /// (other than the time field) are processed.
    ///
    /// # Errors
    ///
    /// - `EmptyDataset` for an empty record set
    /// - `Configuration` when the options fail validation
    /// - `InvalidDataType` in strict mode
    /// - `EmptySample` when a numeric field has no valid values after cleaning
    #[instrument(skip(self, records, options), fields(
        records = records.len(),
        method = %options.cleaning.outlier_method,
    ))]
    pub fn process_data(
        &self,
        records: &[Record],
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult> {
        if records.is_empty() {
            return Err(FiscalError::EmptyDataset);
        }
        options.validate()?;

        let start = Instant::now();
        let mut options = options.clone();
        if options.numeric_fields.is_empty() {
            options.numeric_fields = infer_numeric_fields(records, &options.quality.time_field);
            log_stage!(
                self.log_config,
                fields = ?options.numeric_fields,
                "Inferred numeric fields"
            );
        }
        let method = options.cleaning.outlier_method;

        let cleaned = DataCleaner::from_options(&options)
            .with_log_config(self.log_config.clone())
            .clean(records)?;
        let data = cleaned.records;

        let mut statistical_analysis = BTreeMap::new();
        for field in &options.numeric_fields {
            let sample = numeric_sample(&data, field);
            let stats = DescriptiveStatistics::compute_for(field, &sample)?;
            statistical_analysis.insert(field.clone(), stats);
        }
        log_stage!(
            self.log_config,
            fields = statistical_analysis.len(),
            "Statistics complete"
        );

        let quality_assessment =
            QualityAssessor::from_options(&options).assess(&data, Some(&cleaned.report));

        let outliers: BTreeMap<String, _> = options
            .numeric_fields
            .iter()
            .map(|field| (field.clone(), detect_record_outliers(&data, field, method)))
            .collect();

        let anomalies = AnomalyIdentifier::new(method)
            .with_thresholds(options.severity.clone())
            .with_key_fields(options.required_fields.clone())
            .identify(&data, &statistical_analysis, &outliers);

        let advanced_metrics = MetricsCalculator::new(options.quality.time_field.clone()).compute(
            &data,
            &options.numeric_fields,
            &outliers,
        );

        let processing_time = start.elapsed().as_secs_f64() * 1000.0;
        let timestamp = Utc::now();
        self.history.record(ProcessingHistoryEntry {
            timestamp,
            processing_time_ms: processing_time,
            quality_score: quality_assessment.overall.score,
            input_count: records.len(),
            output_count: data.len(),
        });

        if self.log_config.log_metrics {
            info!(
                input = records.len(),
                output = data.len(),
                quality = quality_assessment.overall.score,
                grade = %quality_assessment.overall.grade,
                anomalies = anomalies.summary.total_anomalies,
                processing_time_ms = processing_time,
                "Processing complete"
            );
        }

        Ok(ProcessingResult {
            processing_metadata: ProcessingMetadata {
                processing_time,
                timestamp,
                input_count: records.len(),
                output_count: data.len(),
                numeric_fields: options.numeric_fields.clone(),
                outlier_method: method,
            },
            processed_data: data,
            cleaning_report: cleaned.report,
            quality_assessment,
            statistical_analysis,
            anomalies,
            advanced_metrics,
        })
    }

    /// Compares an assessment against thresholds.
    ///
    /// A score below its threshold is a failure; a score less than
    /// `warning_margin` above it is a warning.
    pub fn validate_quality(
        &self,
        assessment: &QualityAssessment,
        thresholds: &QualityThresholds,
    ) -> QualityValidation {
        let checks = std::iter::once(("overall", assessment.overall.score, thresholds.overall))
            .chain(QualityDimension::ALL.into_iter().map(|dimension| {
                (
                    dimension.name(),
                    assessment.dimensions.get(dimension),
                    dimension_threshold(thresholds, dimension),
                )
            }));

        let mut failures = Vec::new();
        let mut warnings = Vec::new();
        for (dimension, score, threshold) in checks {
            if score < threshold {
                failures.push(QualityIssue {
                    dimension: dimension.to_string(),
                    score,
                    threshold,
                    message: format!(
                        "{dimension} score {score:.1} is below the required {threshold:.1}"
                    ),
                });
            } else if score < threshold + thresholds.warning_margin {
                warnings.push(QualityIssue {
                    dimension: dimension.to_string(),
                    score,
                    threshold,
                    message: format!(
                        "{dimension} score {score:.1} is within {:.1} of the required {threshold:.1}",
                        thresholds.warning_margin
                    ),
                });
            }
        }

        QualityValidation {
            passed: failures.is_empty(),
            failures,
            warnings,
        }
    }

    /// Summarises every run recorded by this processor.
    pub fn generate_processing_report(&self) -> ProcessingReport {
        self.history.report()
    }
}

fn dimension_threshold(thresholds: &QualityThresholds, dimension: QualityDimension) -> f64 {
    match dimension {
        QualityDimension::Completeness => thresholds.completeness,
        QualityDimension::Accuracy => thresholds.accuracy,
        QualityDimension::Consistency => thresholds.consistency,
        QualityDimension::Validity => thresholds.validity,
        QualityDimension::Uniqueness => thresholds.uniqueness,
        QualityDimension::Timeliness => thresholds.timeliness,
    }
}

/// Fields whose values are inferred as numeric, excluding the time field.
pub fn infer_numeric_fields(records: &[Record], time_field: &str) -> Vec<String> {
    let engine = TypeInferenceEngine::new();
    let mut fields: Vec<&str> = records.iter().flat_map(Record::field_names).collect();
    fields.sort_unstable();
    fields.dedup();
    fields
        .into_iter()
        .filter(|f| !f.eq_ignore_ascii_case(time_field))
        .filter(|f| engine.infer_field(records, f).inferred_type.is_numeric())
        .map(str::to_string)
        .collect()
}
