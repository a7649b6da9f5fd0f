//! Record-set processing: cleaning, quality scoring and orchestration.
//!
//! ## Overview
//!
//! - **[`DataCleaner`]**: required-field filtering, imputation and outlier removal
//! - **[`QualityAssessor`]**: six-dimension quality score with a letter grade
//! - **[`DataProcessor`]**: runs every stage and keeps a processing history
//!
//! ## Pipeline
//!
//! ```text
//! records
//!     ├── DataCleaner          -> processed records + CleaningReport
//!     ├── statistics           -> per-field DescriptiveStatistics
//!     ├── QualityAssessor      -> QualityAssessment
//!     ├── AnomalyIdentifier    -> AnomalyReport
//!     └── MetricsCalculator    -> AdvancedMetrics
//! ```

pub mod cleaner;
pub mod history;
pub mod processor;
pub mod quality;

pub use cleaner::{CleanedData, CleaningReport, DataCleaner};
pub use history::{ProcessingHistory, ProcessingHistoryEntry, ProcessingReport, QualityTrend};
pub use processor::{
    DataProcessor, ProcessingMetadata, ProcessingResult, QualityIssue, QualityValidation,
};
pub use quality::{
    FieldAnalysis, Grade, OverallQuality, QualityAssessment, QualityAssessor, QualityDimension,
    QualityDimensions,
};
