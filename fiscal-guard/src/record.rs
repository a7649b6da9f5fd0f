//! Flat key-value records and numeric value extraction.
//!
//! A [`Record`] is one observation (a country-year spending or GDP entry).
//! Field values arrive loosely typed from CSV/JSON loaders, so every numeric
//! read goes through [`NumericValue`], which keeps "absent" and
//! "present but not a number" apart instead of collapsing both into NaN.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single loosely typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value as delivered by the loader.
    Number(f64),
    /// Any textual value, including numbers that were never parsed.
    Text(String),
}

impl FieldValue {
    /// Returns true when the value counts as missing: null or blank text.
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    /// Classifies this value for numeric processing.
    pub fn to_numeric(&self) -> NumericValue {
        match self {
            FieldValue::Null => NumericValue::Absent,
            FieldValue::Number(v) if v.is_finite() => NumericValue::Present(*v),
            FieldValue::Number(v) => NumericValue::Invalid(v.to_string()),
            FieldValue::Bool(b) => NumericValue::Invalid(b.to_string()),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return NumericValue::Absent;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => NumericValue::Present(v),
                    _ => NumericValue::Invalid(trimmed.to_string()),
                }
            }
        }
    }

    /// Canonical text used for duplicate detection and distinct counting.
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(v) => format_number(*v),
            FieldValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            other => write!(f, "{}", other.canonical()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Tri-state view of a field for numeric processing.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// Present and parseable as a finite number.
    Present(f64),
    /// Present but not coercible to a finite number; holds the raw text.
    Invalid(String),
    /// Absent, null or blank.
    Absent,
}

impl NumericValue {
    /// Returns the number when present.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumericValue::Present(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns true if the value is present and numeric.
    pub fn is_present(&self) -> bool {
        matches!(self, NumericValue::Present(_))
    }

    /// Returns true if the value is present but not numeric.
    pub fn is_invalid(&self) -> bool {
        matches!(self, NumericValue::Invalid(_))
    }
}

/// One observation: a flat map from field name to value.
///
/// Fields are kept in a `BTreeMap` so serialization and duplicate keys are
/// deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the raw value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns true if the field exists and is not null or blank.
    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_missing())
    }

    /// Reads a field for numeric processing.
    pub fn numeric(&self, field: &str) -> NumericValue {
        self.get(field)
            .map_or(NumericValue::Absent, FieldValue::to_numeric)
    }

    /// Looks up a field by name ignoring ASCII case.
    pub fn get_ignore_case(&self, field: &str) -> Option<(&str, &FieldValue)> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the field names in name order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a composite key from the given fields, used for duplicate detection.
    pub fn key_for(&self, fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| self.get(f).map(FieldValue::canonical).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    /// Identifying values (field -> canonical text) for the given fields.
    pub fn identity(&self, fields: &[String]) -> BTreeMap<String, String> {
        fields
            .iter()
            .filter_map(|f| self.get(f).map(|v| (f.clone(), v.canonical())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Extracts the numeric view of one field across all records.
pub fn numeric_column(records: &[Record], field: &str) -> Vec<NumericValue> {
    records.iter().map(|r| r.numeric(field)).collect()
}

/// Extracts the valid numbers of one field, paired with their record index.
pub fn indexed_sample(records: &[Record], field: &str) -> Vec<(usize, f64)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.numeric(field).as_f64().map(|v| (i, v)))
        .collect()
}

/// Extracts the valid numbers of one field in record order.
pub fn numeric_sample(records: &[Record], field: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.numeric(field).as_f64())
        .collect()
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}
