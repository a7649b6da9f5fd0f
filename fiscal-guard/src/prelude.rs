//! Prelude for commonly used types and traits in fiscal-guard.

pub use crate::config::{
    CleaningConfig, MissingValueStrategy, OutlierAction, OutlierMethod, ProcessingOptions,
    QualityConfig, QualityThresholds, QualityWeights, SeverityThresholds,
};
pub use crate::core::{
    CleaningReport, DataCleaner, DataProcessor, Grade, ProcessingResult, QualityAssessment,
    QualityAssessor,
};
pub use crate::error::{ErrorContext, FiscalError, Result};
pub use crate::logging::LogConfig;
pub use crate::record::{FieldValue, NumericValue, Record};
