//! Numerical analyzers over numeric samples and record sets.
//!
//! Each analyzer is a pure computation: it reads samples or records and
//! returns owned results, leaving the input untouched.
//!
//! ## Available Analyzers
//!
//! - **Statistics** (`statistics`): mean, median, mode, dispersion, percentiles, skewness, kurtosis
//! - **Outliers** (`outliers`): IQR, z-score and modified z-score detection
//! - **Imputation** (`imputation`): mean, median, interpolation and zero fill
//! - **Type Inference** (`inference`): value formats and field types for consistency scoring
//! - **Anomalies** (`anomaly`): severity grading of flagged values
//! - **Correlation** (`correlation`): Pearson coefficients between numeric fields
//! - **Metrics** (`metrics`): volatility, trend strength and anomaly score per field
//!
//! ## Example Usage
//!
//! ```rust
//! use fiscal_guard::analyzers::{detect_outliers, DescriptiveStatistics};
//! use fiscal_guard::config::OutlierMethod;
//!
//! let sample = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
//! let stats = DescriptiveStatistics::compute(&sample).unwrap();
//! assert_eq!(stats.median, 5.5);
//!
//! let outliers = detect_outliers(&sample, OutlierMethod::Iqr);
//! assert_eq!(outliers.len(), 1);
//! ```

pub mod anomaly;
pub mod correlation;
pub mod imputation;
pub mod inference;
pub mod metrics;
pub mod outliers;
pub mod statistics;

pub use anomaly::{Anomaly, AnomalyIdentifier, AnomalyReport, AnomalySummary, Severity};
pub use correlation::{
    correlation_matrix, pearson, CorrelationDirection, CorrelationPair, CorrelationStrength,
};
pub use imputation::{impute, Imputation};
pub use inference::{
    FieldTypeInference, InferredFieldType, TypeInferenceEngine, TypeInferenceEngineBuilder,
    ValueFormat,
};
pub use metrics::{AdvancedMetrics, FieldMetrics, LinearTrend, MetricsCalculator};
pub use outliers::{detect_outliers, detect_record_outliers, Outlier, OutlierBounds, OutlierDetector};
pub use statistics::{DescriptiveStatistics, Percentiles};
