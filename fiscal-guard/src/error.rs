//! Error types for the fiscal-guard processing core.
//!
//! Conditions that make a requested operation meaningless (no records, a
//! numeric field without a single usable value) surface as [`FiscalError`].
//! Problems with individual records are recovered locally and tallied in the
//! cleaning report or the quality assessment instead.

use thiserror::Error;

/// The main error type for the fiscal-guard library.
#[derive(Error, Debug)]
pub enum FiscalError {
    /// The orchestrator was handed an empty record set.
    #[error("Dataset is empty: at least one record is required for processing")]
    EmptyDataset,

    /// The cleaner was handed an empty record set.
    #[error("No input records to clean")]
    EmptyInput,

    /// A field has no valid numeric values where statistics were requested.
    #[error("Field '{field}' has no valid numeric values")]
    EmptySample {
        /// Name of the field (or `<sample>` for anonymous samples)
        field: String,
    },

    /// A value expected to be numeric could not be coerced (strict mode only).
    #[error("Invalid numeric value '{value}' in field '{field}' at record {record_index}")]
    InvalidDataType {
        /// Name of the offending field
        field: String,
        /// Index of the record in the input slice
        record_index: usize,
        /// Raw value as it appeared in the record
        value: String,
    },

    /// Error related to caller-supplied options.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for `Result<T, FiscalError>`.
///
/// # Examples
///
/// ```rust
/// use fiscal_guard::error::{FiscalError, Result};
///
/// fn require_rows(count: usize) -> Result<usize> {
///     if count == 0 {
///         return Err(FiscalError::EmptyDataset);
///     }
///     Ok(count)
/// }
///
/// assert!(require_rows(0).is_err());
/// ```
pub type Result<T> = std::result::Result<T, FiscalError>;

impl FiscalError {
    /// Creates an empty sample error for the given field.
    pub fn empty_sample(field: impl Into<String>) -> Self {
        Self::EmptySample {
            field: field.into(),
        }
    }

    /// Creates an invalid data type error.
    pub fn invalid_data_type(
        field: impl Into<String>,
        record_index: usize,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidDataType {
            field: field.into(),
            record_index,
            value: value.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true for the "nothing to process" family of errors.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyDataset | Self::EmptyInput)
    }
}

impl From<serde_json::Error> for FiscalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<FiscalError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            FiscalError::Io(io) => FiscalError::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {}", f(), io),
            )),
            FiscalError::Serialization(inner) => {
                FiscalError::Serialization(format!("{}: {}", f(), inner))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_message() {
        let err = FiscalError::empty_sample("totalSpending");
        assert_eq!(
            err.to_string(),
            "Field 'totalSpending' has no valid numeric values"
        );
    }

    #[test]
    fn test_invalid_data_type_message() {
        let err = FiscalError::invalid_data_type("gdp", 4, "n/a");
        assert_eq!(
            err.to_string(),
            "Invalid numeric value 'n/a' in field 'gdp' at record 4"
        );
    }

    #[test]
    fn test_empty_input_family() {
        assert!(FiscalError::EmptyDataset.is_empty_input());
        assert!(FiscalError::EmptyInput.is_empty_input());
        assert!(!FiscalError::empty_sample("x").is_empty_input());
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: FiscalError = parse.unwrap_err().into();
        assert!(matches!(err, FiscalError::Serialization(_)));
    }

    #[test]
    fn test_error_context_keeps_domain_errors() {
        fn failing() -> Result<()> {
            Err(FiscalError::EmptyDataset)
        }

        let err = failing().context("While processing").unwrap_err();
        assert!(matches!(err, FiscalError::EmptyDataset));
    }

    #[test]
    fn test_error_context_prefixes_serialization() {
        fn failing() -> Result<()> {
            Err(FiscalError::Serialization("unexpected token".to_string()))
        }

        let err = failing().context("Parsing options").unwrap_err();
        assert!(matches!(err, FiscalError::Serialization(_)));
        assert!(err.to_string().contains("Parsing options: unexpected token"));
    }
}
