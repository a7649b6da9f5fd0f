//! Caller configuration for the processing pipeline.
//!
//! Every option is enumerated with an explicit default. Options deserialize
//! from camelCase JSON and reject unknown keys, so a misspelled option fails
//! validation rather than silently falling back to a default.
//!
//! # Example
//!
//! ```rust
//! use fiscal_guard::config::{MissingValueStrategy, OutlierMethod, ProcessingOptions};
//!
//! let options = ProcessingOptions::from_json_str(
//!     r#"{
//!         "requiredFields": ["country", "year"],
//!         "numericFields": ["totalSpending"],
//!         "cleaning": {"removeOutliers": true, "outlierMethod": "modified_zscore"}
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(options.cleaning.outlier_method, OutlierMethod::ModifiedZScore);
//! assert_eq!(options.cleaning.missing_value_strategy, MissingValueStrategy::Median);
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, FiscalError, Result};

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutlierMethod {
    /// Tukey fences at 1.5 IQR beyond the quartiles.
    #[default]
    #[serde(rename = "iqr")]
    Iqr,
    /// |z| > 3 using the population standard deviation.
    #[serde(rename = "zscore")]
    ZScore,
    /// |0.6745 (x - median) / MAD| > 3.5.
    #[serde(rename = "modified_zscore")]
    ModifiedZScore,
}

impl OutlierMethod {
    /// Returns the wire name of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "iqr",
            OutlierMethod::ZScore => "zscore",
            OutlierMethod::ModifiedZScore => "modified_zscore",
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy for filling missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValueStrategy {
    /// Mean of the present values.
    Mean,
    /// Median of the present values.
    #[default]
    Median,
    /// Linear interpolation by position, constant at the edges.
    Interpolate,
    /// Zero fill.
    Zero,
}

impl MissingValueStrategy {
    /// Returns the wire name of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingValueStrategy::Mean => "mean",
            MissingValueStrategy::Median => "median",
            MissingValueStrategy::Interpolate => "interpolate",
            MissingValueStrategy::Zero => "zero",
        }
    }
}

impl fmt::Display for MissingValueStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the cleaner does with an outlier found in a field that is not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierAction {
    /// Drop the whole record.
    #[default]
    RemoveRecord,
    /// Keep the record and null the offending field.
    NullField,
}

/// Cleaning sub-options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CleaningConfig {
    /// Remove records flagged by the outlier detector
    pub remove_outliers: bool,
    /// Impute missing numeric values instead of leaving them null
    pub fill_missing_values: bool,
    /// Outlier detection method
    pub outlier_method: OutlierMethod,
    /// Imputation strategy
    pub missing_value_strategy: MissingValueStrategy,
    /// Handling of outliers in fields that are not required
    pub non_required_outlier_action: OutlierAction,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            remove_outliers: false,
            fill_missing_values: true,
            outlier_method: OutlierMethod::Iqr,
            missing_value_strategy: MissingValueStrategy::Median,
            non_required_outlier_action: OutlierAction::RemoveRecord,
        }
    }
}

impl CleaningConfig {
    /// Sets whether outliers are removed.
    pub fn with_remove_outliers(mut self, enabled: bool) -> Self {
        self.remove_outliers = enabled;
        self
    }

    /// Sets whether missing values are imputed.
    pub fn with_fill_missing_values(mut self, enabled: bool) -> Self {
        self.fill_missing_values = enabled;
        self
    }

    /// Sets the outlier detection method.
    pub fn with_outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = method;
        self
    }

    /// Sets the imputation strategy.
    pub fn with_missing_value_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_value_strategy = strategy;
        self
    }

    /// Sets the handling of outliers in non-required fields.
    pub fn with_non_required_outlier_action(mut self, action: OutlierAction) -> Self {
        self.non_required_outlier_action = action;
        self
    }
}

/// Weights of the quality dimensions in the overall score.
///
/// Weights are normalised by their sum, so they need not add up to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub validity: f64,
    pub uniqueness: f64,
    pub timeliness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.25,
            accuracy: 0.25,
            consistency: 0.15,
            validity: 0.20,
            uniqueness: 0.10,
            timeliness: 0.05,
        }
    }
}

impl QualityWeights {
    /// Equal weight for every dimension.
    pub fn uniform() -> Self {
        Self {
            completeness: 1.0,
            accuracy: 1.0,
            consistency: 1.0,
            validity: 1.0,
            uniqueness: 1.0,
            timeliness: 1.0,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.completeness
            + self.accuracy
            + self.consistency
            + self.validity
            + self.uniqueness
            + self.timeliness
    }

    fn validate(&self) -> Result<()> {
        let all = [
            self.completeness,
            self.accuracy,
            self.consistency,
            self.validity,
            self.uniqueness,
            self.timeliness,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FiscalError::configuration(
                "quality weights must be finite and non-negative",
            ));
        }
        if self.total() <= 0.0 {
            return Err(FiscalError::configuration(
                "quality weights must have a positive sum",
            ));
        }
        Ok(())
    }
}

/// Settings for the quality assessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityConfig {
    /// Dimension weights for the overall score
    pub weights: QualityWeights,
    /// Name of the time dimension, matched ignoring case
    pub time_field: String,
    /// Year timeliness is measured against; current UTC year when unset
    pub reference_year: Option<i32>,
    /// Absolute bound beyond which a numeric value fails the accuracy check
    pub accuracy_bound: f64,
    /// Dimensions scoring below this produce a recommendation
    pub recommendation_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            time_field: "year".to_string(),
            reference_year: None,
            accuracy_bound: 1e15,
            recommendation_threshold: 70.0,
        }
    }
}

impl QualityConfig {
    /// Sets the dimension weights.
    pub fn with_weights(mut self, weights: QualityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the time dimension field name.
    pub fn with_time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = field.into();
        self
    }

    /// Pins the reference year used for timeliness.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Sets the accuracy domain bound.
    pub fn with_accuracy_bound(mut self, bound: f64) -> Self {
        self.accuracy_bound = bound;
        self
    }

    /// Sets the recommendation threshold.
    pub fn with_recommendation_threshold(mut self, threshold: f64) -> Self {
        self.recommendation_threshold = threshold;
        self
    }

    /// Resolves the reference year, falling back to the current UTC year.
    pub fn resolved_reference_year(&self) -> i32 {
        use chrono::Datelike;
        self.reference_year
            .unwrap_or_else(|| chrono::Utc::now().year())
    }

    fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.accuracy_bound.is_finite() && self.accuracy_bound > 0.0) {
            return Err(FiscalError::configuration(
                "accuracyBound must be a positive finite number",
            ));
        }
        if !(0.0..=100.0).contains(&self.recommendation_threshold) {
            return Err(FiscalError::configuration(
                "recommendationThreshold must lie in [0, 100]",
            ));
        }
        Ok(())
    }
}

/// Medium/high severity multipliers for one outlier method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeverityBands {
    /// Deviation at or above which an anomaly is medium
    pub medium: f64,
    /// Deviation at or above which an anomaly is high
    pub high: f64,
}

impl SeverityBands {
    pub const fn new(medium: f64, high: f64) -> Self {
        Self { medium, high }
    }
}

/// Severity multipliers per outlier method.
///
/// Defaults keep the IQR bands at 2x/3x and scale the z-score bands by
/// roughly the ratio of their detection thresholds to the 1.5 IQR fence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SeverityThresholds {
    pub iqr: SeverityBands,
    pub zscore: SeverityBands,
    pub modified_zscore: SeverityBands,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            iqr: SeverityBands::new(2.0, 3.0),
            zscore: SeverityBands::new(4.0, 6.0),
            modified_zscore: SeverityBands::new(4.5, 7.0),
        }
    }
}

impl SeverityThresholds {
    /// Returns the bands for a method.
    pub fn for_method(&self, method: OutlierMethod) -> SeverityBands {
        match method {
            OutlierMethod::Iqr => self.iqr,
            OutlierMethod::ZScore => self.zscore,
            OutlierMethod::ModifiedZScore => self.modified_zscore,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, bands) in [
            ("iqr", self.iqr),
            ("zscore", self.zscore),
            ("modified_zscore", self.modified_zscore),
        ] {
            if !(bands.medium.is_finite() && bands.high.is_finite()) || bands.medium > bands.high
            {
                return Err(FiscalError::configuration(format!(
                    "severity bands for {name} must be finite with medium <= high"
                )));
            }
        }
        Ok(())
    }
}

/// Minimum dimension scores used by `validate_quality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct QualityThresholds {
    pub overall: f64,
    pub completeness: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub validity: f64,
    pub uniqueness: f64,
    pub timeliness: f64,
    /// Scores within this margin above a threshold produce a warning
    pub warning_margin: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            overall: 70.0,
            completeness: 80.0,
            accuracy: 80.0,
            consistency: 70.0,
            validity: 80.0,
            uniqueness: 90.0,
            timeliness: 50.0,
            warning_margin: 10.0,
        }
    }
}

impl QualityThresholds {
    /// Thresholds that only fail clearly broken data.
    pub fn lenient() -> Self {
        Self {
            overall: 50.0,
            completeness: 60.0,
            accuracy: 60.0,
            consistency: 50.0,
            validity: 60.0,
            uniqueness: 70.0,
            timeliness: 0.0,
            warning_margin: 5.0,
        }
    }

    /// Thresholds suitable for publication-grade datasets.
    pub fn strict() -> Self {
        Self {
            overall: 90.0,
            completeness: 95.0,
            accuracy: 95.0,
            consistency: 90.0,
            validity: 95.0,
            uniqueness: 99.0,
            timeliness: 70.0,
            warning_margin: 2.0,
        }
    }
}

/// Options for one `process_data` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProcessingOptions {
    /// Cleaning sub-options
    pub cleaning: CleaningConfig,
    /// Fields that must be present and non-empty
    pub required_fields: Vec<String>,
    /// Fields processed as numbers
    pub numeric_fields: Vec<String>,
    /// Fail on present-but-invalid numeric values instead of treating them as missing
    pub strict: bool,
    /// Quality assessor settings
    pub quality: QualityConfig,
    /// Anomaly severity multipliers
    pub severity: SeverityThresholds,
}

impl ProcessingOptions {
    /// Creates options with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates options from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| {
            FiscalError::configuration(format!("invalid processing options: {e}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Reads, parses and validates options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading options file {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    /// Sets the required fields.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the numeric fields.
    pub fn with_numeric_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the cleaning sub-options.
    pub fn with_cleaning(mut self, cleaning: CleaningConfig) -> Self {
        self.cleaning = cleaning;
        self
    }

    /// Enables or disables strict numeric parsing.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the quality assessor settings.
    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the anomaly severity multipliers.
    pub fn with_severity(mut self, severity: SeverityThresholds) -> Self {
        self.severity = severity;
        self
    }

    /// Checks option values that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self
            .required_fields
            .iter()
            .chain(&self.numeric_fields)
            .any(|f| f.trim().is_empty())
        {
            return Err(FiscalError::configuration("field names must not be blank"));
        }
        self.quality.validate()?;
        self.severity.validate()?;
        Ok(())
    }
}
