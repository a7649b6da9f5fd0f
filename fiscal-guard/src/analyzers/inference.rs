//! Field type and format inference over loosely typed records.
//!
//! Each non-missing value is classified into a [`ValueFormat`]. A field's
//! dominant format is the most common one among its sampled values; the
//! share of values matching it feeds the consistency dimension of the
//! quality assessment. The inferred type follows a fixed priority:
//! Date > Boolean > Float > Integer > Categorical > Text, falling back to
//! `Mixed` when no type reaches the confidence threshold.
//!
//! # Example
//!
//! ```rust
//! use fiscal_guard::analyzers::inference::{InferredFieldType, TypeInferenceEngine};
//! use fiscal_guard::record::Record;
//!
//! let records: Vec<Record> = (0..5)
//!     .map(|i| Record::new().with("gdp", 1000.5 + f64::from(i)))
//!     .collect();
//!
//! let engine = TypeInferenceEngine::builder().confidence_threshold(0.8).build();
//! let inference = engine.infer_field(&records, "gdp");
//! assert_eq!(inference.inferred_type, InferredFieldType::Float);
//! assert_eq!(inference.format_share, 1.0);
//! ```

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::{FieldValue, Record};

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid regex")
});
static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2})?)?|\d{1,2}/\d{1,2}/\d{4}|\d{1,2}\.\d{1,2}\.\d{4})$")
        .expect("valid regex")
});
static BOOLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(true|false|yes|no)$").expect("valid regex"));

/// Configuration for the type inference engine
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Number of values sampled per field (default: 1000)
    pub sample_size: usize,
    /// Minimum share of values a type needs to be chosen (default: 0.7)
    pub confidence_threshold: f64,
    /// Maximum distinct values for a text field to count as categorical (default: 50)
    pub categorical_threshold: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            confidence_threshold: 0.7,
            categorical_threshold: 50,
        }
    }
}

/// Format class of a single non-missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueFormat {
    Integer,
    Decimal,
    Boolean,
    Date,
    /// All upper case text, e.g. ISO country codes
    UpperCase,
    /// All lower case text
    LowerCase,
    /// Leading capital, e.g. country names
    Capitalized,
    /// Anything else
    MixedText,
}

impl ValueFormat {
    /// Returns true for integer and decimal formats.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueFormat::Integer | ValueFormat::Decimal)
    }

    /// Returns true if two formats count as the same canonical format.
    ///
    /// Integers and decimals are interchangeable; text casing is not.
    pub fn is_compatible_with(&self, other: ValueFormat) -> bool {
        *self == other || (self.is_numeric() && other.is_numeric())
    }
}

/// Inferred type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InferredFieldType {
    Integer,
    Float,
    Boolean,
    Date,
    Categorical { cardinality: usize },
    Text,
    Mixed { types: Vec<String> },
    /// No non-missing values were sampled
    Unknown,
}

impl InferredFieldType {
    /// Get the base type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            InferredFieldType::Integer => "Integer",
            InferredFieldType::Float => "Float",
            InferredFieldType::Boolean => "Boolean",
            InferredFieldType::Date => "Date",
            InferredFieldType::Categorical { .. } => "Categorical",
            InferredFieldType::Text => "Text",
            InferredFieldType::Mixed { .. } => "Mixed",
            InferredFieldType::Unknown => "Unknown",
        }
    }

    /// Returns true for integer and float types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, InferredFieldType::Integer | InferredFieldType::Float)
    }
}

impl fmt::Display for InferredFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Inference outcome for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTypeInference {
    pub inferred_type: InferredFieldType,
    /// Share of non-missing samples supporting the inferred type (0.0 to 1.0)
    pub confidence: f64,
    pub samples_analyzed: usize,
    pub null_count: usize,
    /// Most common value format, `None` when every sample was missing
    pub dominant_format: Option<ValueFormat>,
    /// Share of non-missing samples matching the dominant format (1.0 when none)
    pub format_share: f64,
}

/// Format counts gathered from a sample.
#[derive(Debug, Default)]
pub struct FormatStats {
    pub total_samples: usize,
    pub null_count: usize,
    pub formats: HashMap<ValueFormat, usize>,
    pub unique_values: HashMap<String, usize>,
}

impl FormatStats {
    fn non_null(&self) -> usize {
        self.total_samples - self.null_count
    }

    fn count(&self, format: ValueFormat) -> usize {
        self.formats.get(&format).copied().unwrap_or(0)
    }

    fn text_count(&self) -> usize {
        self.count(ValueFormat::UpperCase)
            + self.count(ValueFormat::LowerCase)
            + self.count(ValueFormat::Capitalized)
            + self.count(ValueFormat::MixedText)
    }

    /// Most common format; ties resolve to the lowest variant.
    fn dominant(&self) -> Option<(ValueFormat, usize)> {
        self.formats
            .iter()
            .map(|(f, c)| (*f, *c))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }
}

/// Builder for TypeInferenceEngine
pub struct TypeInferenceEngineBuilder {
    config: InferenceConfig,
}

impl TypeInferenceEngineBuilder {
    /// Set the sample size for type detection
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set the confidence threshold
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the categorical cardinality threshold
    pub fn categorical_threshold(mut self, threshold: usize) -> Self {
        self.config.categorical_threshold = threshold;
        self
    }

    /// Build the TypeInferenceEngine
    pub fn build(self) -> TypeInferenceEngine {
        TypeInferenceEngine {
            config: self.config,
        }
    }
}

/// Infers field types and canonical formats from record values.
#[derive(Debug, Clone, Default)]
pub struct TypeInferenceEngine {
    config: InferenceConfig,
}

impl TypeInferenceEngine {
    /// Create a new builder for TypeInferenceEngine
    pub fn builder() -> TypeInferenceEngineBuilder {
        TypeInferenceEngineBuilder {
            config: InferenceConfig::default(),
        }
    }

    /// Create a TypeInferenceEngine with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Classifies one value; `None` for missing values.
    pub fn classify(&self, value: &FieldValue) -> Option<ValueFormat> {
        match value {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(ValueFormat::Boolean),
            FieldValue::Number(v) if v.is_finite() && v.fract() == 0.0 => {
                Some(ValueFormat::Integer)
            }
            FieldValue::Number(v) if v.is_finite() => Some(ValueFormat::Decimal),
            FieldValue::Number(_) => Some(ValueFormat::MixedText),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(classify_text(trimmed))
                }
            }
        }
    }

    /// Gathers format statistics for the first `sample_size` values of a field.
    pub fn analyze_field(&self, records: &[Record], field: &str) -> FormatStats {
        let mut stats = FormatStats::default();
        for record in records.iter().take(self.config.sample_size) {
            stats.total_samples += 1;
            let value = record.get(field).unwrap_or(&FieldValue::Null);
            match self.classify(value) {
                None => stats.null_count += 1,
                Some(format) => {
                    *stats.formats.entry(format).or_insert(0) += 1;
                    *stats.unique_values.entry(value.canonical()).or_insert(0) += 1;
                }
            }
        }
        stats
    }

    /// Infers the type and dominant format of a field.
    pub fn infer_field(&self, records: &[Record], field: &str) -> FieldTypeInference {
        let stats = self.analyze_field(records, field);
        self.determine_type(&stats)
    }

    /// Determine the best type match from statistics
    pub fn determine_type(&self, stats: &FormatStats) -> FieldTypeInference {
        let non_null = stats.non_null();
        if non_null == 0 {
            return FieldTypeInference {
                inferred_type: InferredFieldType::Unknown,
                confidence: 0.0,
                samples_analyzed: stats.total_samples,
                null_count: stats.null_count,
                dominant_format: None,
                format_share: 1.0,
            };
        }

        let share = |count: usize| count as f64 / non_null as f64;
        let integer = stats.count(ValueFormat::Integer);
        let decimal = stats.count(ValueFormat::Decimal);
        let numeric_share = share(integer + decimal);
        let boolean_share = share(stats.count(ValueFormat::Boolean));
        let date_share = share(stats.count(ValueFormat::Date));
        let text_share = share(stats.text_count());
        let threshold = self.config.confidence_threshold;

        let (inferred_type, confidence) = if date_share >= threshold {
            (InferredFieldType::Date, date_share)
        } else if boolean_share >= threshold {
            (InferredFieldType::Boolean, boolean_share)
        } else if numeric_share >= threshold && decimal > 0 {
            (InferredFieldType::Float, numeric_share)
        } else if numeric_share >= threshold {
            (InferredFieldType::Integer, numeric_share)
        } else if text_share >= threshold
            && stats.unique_values.len() <= self.config.categorical_threshold
            && stats.unique_values.len() < non_null
        {
            (
                InferredFieldType::Categorical {
                    cardinality: stats.unique_values.len(),
                },
                text_share,
            )
        } else if text_share >= threshold {
            (InferredFieldType::Text, text_share)
        } else {
            let mut types: Vec<String> = [
                ("Numeric", numeric_share),
                ("Boolean", boolean_share),
                ("Date", date_share),
                ("Text", text_share),
            ]
            .iter()
            .filter(|(_, s)| *s > 0.1)
            .map(|(name, _)| name.to_string())
            .collect();
            types.sort();
            let max = numeric_share
                .max(boolean_share)
                .max(date_share)
                .max(text_share);
            (InferredFieldType::Mixed { types }, max)
        };

        let (dominant_format, format_share) = match stats.dominant() {
            Some((format, _)) => {
                let matching: usize = stats
                    .formats
                    .iter()
                    .filter(|(f, _)| f.is_compatible_with(format))
                    .map(|(_, c)| *c)
                    .sum();
                (Some(format), share(matching))
            }
            None => (None, 1.0),
        };

        FieldTypeInference {
            inferred_type,
            confidence,
            samples_analyzed: stats.total_samples,
            null_count: stats.null_count,
            dominant_format,
            format_share,
        }
    }
}

fn classify_text(value: &str) -> ValueFormat {
    if INTEGER.is_match(value) {
        return ValueFormat::Integer;
    }
    if FLOAT.is_match(value) {
        return ValueFormat::Decimal;
    }
    if DATE.is_match(value) {
        return ValueFormat::Date;
    }
    if BOOLEAN.is_match(value) {
        return ValueFormat::Boolean;
    }

    let letters: Vec<char> = value.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return ValueFormat::MixedText;
    }
    if letters.iter().all(|c| c.is_uppercase()) {
        ValueFormat::UpperCase
    } else if letters.iter().all(|c| c.is_lowercase()) {
        ValueFormat::LowerCase
    } else if value.chars().next().is_some_and(char::is_uppercase) {
        ValueFormat::Capitalized
    } else {
        ValueFormat::MixedText
    }
}
