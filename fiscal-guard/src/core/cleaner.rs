//! Record cleaning: required-field filtering, imputation and outlier removal.
//!
//! The cleaner never mutates its input; it returns new records together with
//! a [`CleaningReport`] whose counts always satisfy
//! `cleaned_count + removed_count == original_count`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::analyzers::imputation::impute;
use crate::analyzers::outliers::detect_record_outliers;
use crate::config::{CleaningConfig, OutlierAction, ProcessingOptions};
use crate::error::{FiscalError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::record::{FieldValue, NumericValue, Record};
use crate::{log_record_event, log_stage};

/// Counts describing one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub original_count: usize,
    pub cleaned_count: usize,
    pub removed_count: usize,
    /// Records with at least one value flagged as an outlier
    pub outlier_count: usize,
    /// Missing numeric values (absent, null, blank or invalid) in kept records
    pub missing_value_count: usize,
    /// Present-but-invalid numeric values, also counted as missing
    pub invalid_value_count: usize,
    /// Records dropped because a required field was missing
    pub missing_required_count: usize,
    /// Values filled by the imputer
    pub imputed_value_count: usize,
    /// Individual values flagged as outliers, across all fields
    pub outlier_value_count: usize,
    /// Flagged values per numeric field
    pub field_outliers: BTreeMap<String, usize>,
}

impl CleaningReport {
    /// Share of input records that survived cleaning, in percent.
    pub fn retention_rate(&self) -> f64 {
        if self.original_count == 0 {
            return 0.0;
        }
        self.cleaned_count as f64 / self.original_count as f64 * 100.0
    }
}

/// Cleaned records plus the report describing how they were produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedData {
    pub records: Vec<Record>,
    pub report: CleaningReport,
}

/// Applies a [`CleaningConfig`] to record sets.
#[derive(Debug, Clone, Default)]
pub struct DataCleaner {
    config: CleaningConfig,
    required_fields: Vec<String>,
    numeric_fields: Vec<String>,
    strict: bool,
    log_config: LogConfig,
}

impl DataCleaner {
    /// Creates a cleaner with the given configuration and no field lists.
    pub fn new(config: CleaningConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a cleaner from full processing options.
    pub fn from_options(options: &ProcessingOptions) -> Self {
        Self::new(options.cleaning.clone())
            .with_required_fields(options.required_fields.clone())
            .with_numeric_fields(options.numeric_fields.clone())
            .with_strict(options.strict)
    }

    /// Sets the fields every kept record must carry.
    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    /// Sets the fields processed as numbers.
    pub fn with_numeric_fields(mut self, fields: Vec<String>) -> Self {
        self.numeric_fields = fields;
        self
    }

    /// Fails on invalid numeric values instead of treating them as missing.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Returns the cleaning configuration.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Cleans a record set.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for an empty record set, and `InvalidDataType` in strict
    /// mode when a numeric field holds a value that is not a finite number.
    #[instrument(skip(self, records), fields(
        records = records.len(),
        remove_outliers = self.config.remove_outliers,
        fill_missing = self.config.fill_missing_values,
    ))]
    pub fn clean(&self, records: &[Record]) -> Result<CleanedData> {
        if records.is_empty() {
            return Err(FiscalError::EmptyInput);
        }
        if self.strict {
            self.check_strict(records)?;
        }

        let mut report = CleaningReport {
            original_count: records.len(),
            ..CleaningReport::default()
        };

        let mut kept = self.drop_incomplete(records, &mut report);
        log_stage!(
            self.log_config,
            kept = kept.len(),
            dropped = report.missing_required_count,
            "Required field filter complete"
        );

        for field in &self.numeric_fields {
            self.repair_field(&mut kept, field, &mut report);
        }

        if self.config.remove_outliers {
            kept = self.remove_outliers(kept, &mut report);
        }

        report.cleaned_count = kept.len();
        report.removed_count = report.original_count - report.cleaned_count;

        info!(
            original = report.original_count,
            cleaned = report.cleaned_count,
            removed = report.removed_count,
            outliers = report.outlier_count,
            missing = report.missing_value_count,
            "Cleaning complete"
        );
        Ok(CleanedData {
            records: kept,
            report,
        })
    }

    fn check_strict(&self, records: &[Record]) -> Result<()> {
        for (index, record) in records.iter().enumerate() {
            for field in &self.numeric_fields {
                if let NumericValue::Invalid(raw) = record.numeric(field) {
                    return Err(FiscalError::invalid_data_type(
                        field.as_str(),
                        index,
                        truncate_field(&raw, self.log_config.max_field_length),
                    ));
                }
            }
        }
        Ok(())
    }

    fn drop_incomplete(&self, records: &[Record], report: &mut CleaningReport) -> Vec<Record> {
        records
            .iter()
            .enumerate()
            .filter(|(index, record)| {
                let missing = self
                    .required_fields
                    .iter()
                    .find(|field| !record.has_value(field));
                if let Some(field) = missing {
                    report.missing_required_count += 1;
                    log_record_event!(
                        self.log_config,
                        record_index = index,
                        field = %field,
                        "Dropping record missing a required field"
                    );
                    return false;
                }
                true
            })
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Counts and fills (or nulls) the gaps of one numeric field in place.
    fn repair_field(&self, records: &mut [Record], field: &str, report: &mut CleaningReport) {
        let column: Vec<NumericValue> = records.iter().map(|r| r.numeric(field)).collect();
        let missing = column.iter().filter(|v| !v.is_present()).count();
        let invalid = column.iter().filter(|v| v.is_invalid()).count();
        report.missing_value_count += missing;
        report.invalid_value_count += invalid;

        if missing == 0 {
            return;
        }
        if invalid > 0 {
            warn!(field, invalid, "Invalid numeric values treated as missing");
        }

        if !self.config.fill_missing_values {
            null_invalid(records, field, &column);
            return;
        }

        let sample: Vec<Option<f64>> = column.iter().map(NumericValue::as_f64).collect();
        match impute(&sample, self.config.missing_value_strategy) {
            Ok(imputation) => {
                for &position in &imputation.imputed_positions {
                    records[position].set(field, imputation.values[position]);
                }
                report.imputed_value_count += imputation.imputed_count();
                debug!(
                    field,
                    imputed = imputation.imputed_count(),
                    strategy = %self.config.missing_value_strategy,
                    "Imputed missing values"
                );
            }
            Err(FiscalError::EmptySample { .. }) => {
                warn!(
                    field,
                    strategy = %self.config.missing_value_strategy,
                    "No values to impute from, leaving field null"
                );
                null_invalid(records, field, &column);
            }
            Err(other) => {
                warn!(field, error = %other, "Imputation failed, leaving field null");
                null_invalid(records, field, &column);
            }
        }
    }

    /// Flags outliers in every numeric field first, then applies all removals.
    fn remove_outliers(&self, records: Vec<Record>, report: &mut CleaningReport) -> Vec<Record> {
        let method = self.config.outlier_method;
        let mut drop = BTreeSet::new();
        let mut null_fields: Vec<(usize, &str)> = Vec::new();
        let mut flagged_records = BTreeSet::new();

        for field in &self.numeric_fields {
            let outliers = detect_record_outliers(&records, field, method);
            if outliers.is_empty() {
                continue;
            }
            report.outlier_value_count += outliers.len();
            report.field_outliers.insert(field.clone(), outliers.len());

            let required = self.required_fields.contains(field);
            for outlier in outliers {
                flagged_records.insert(outlier.index);
                log_record_event!(
                    self.log_config,
                    record_index = outlier.index,
                    field = %field,
                    value = outlier.value,
                    deviation = outlier.deviation,
                    "Outlier flagged"
                );
                let remove = required
                    || self.config.non_required_outlier_action == OutlierAction::RemoveRecord;
                if remove {
                    drop.insert(outlier.index);
                } else {
                    null_fields.push((outlier.index, field.as_str()));
                }
            }
        }
        report.outlier_count = flagged_records.len();

        let mut records = records;
        for (index, field) in null_fields {
            if !drop.contains(&index) {
                records[index].set(field, FieldValue::Null);
            }
        }

        debug!(
            method = %method,
            flagged_records = report.outlier_count,
            removed = drop.len(),
            "Outlier pass complete"
        );
        records
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !drop.contains(index))
            .map(|(_, record)| record)
            .collect()
    }
}

/// Replaces invalid values with explicit nulls; absent values stay absent.
fn null_invalid(records: &mut [Record], field: &str, column: &[NumericValue]) {
    for (record, value) in records.iter_mut().zip(column) {
        if value.is_invalid() {
            record.set(field, FieldValue::Null);
        }
    }
}
