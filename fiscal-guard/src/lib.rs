//! # Fiscal Guard - Data Processing for Spending and GDP Records
//!
//! Fiscal Guard cleans, profiles and scores tabular government spending and
//! GDP observations keyed by country and year. It is a pure in-memory
//! library: records go in, owned results come out, and nothing touches the
//! network or the filesystem except the optional options-file loader.
//!
//! ## Overview
//!
//! A [`core::DataProcessor`] runs the whole pipeline on a record set:
//! cleaning (missing-value imputation and outlier removal), descriptive
//! statistics per numeric field, a six-dimension quality assessment,
//! anomaly identification, and advanced metrics (volatility, trend
//! strength, correlations). Each run is appended to the processor's history
//! so quality can be tracked across runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use fiscal_guard::prelude::*;
//!
//! # fn example() -> fiscal_guard::error::Result<()> {
//! let mut records = Vec::new();
//! for (i, country) in ["FRA", "DEU", "ITA"].iter().enumerate() {
//!     for year in 2019..2023 {
//!         records.push(
//!             Record::new()
//!                 .with("country", *country)
//!                 .with("year", year)
//!                 .with("totalSpending", 500.0 * (i as f64 + 1.0) + f64::from(year - 2019)),
//!         );
//!     }
//! }
//! records[3].set("totalSpending", FieldValue::Null);
//!
//! let options = ProcessingOptions::new()
//!     .with_required_fields(["country", "year"])
//!     .with_numeric_fields(["totalSpending"])
//!     .with_cleaning(
//!         CleaningConfig::default()
//!             .with_remove_outliers(true)
//!             .with_missing_value_strategy(MissingValueStrategy::Median),
//!     );
//!
//! let processor = DataProcessor::new();
//! let result = processor.process_data(&records, &options)?;
//!
//! assert_eq!(result.cleaning_report.missing_value_count, 1);
//! println!(
//!     "quality {:.1} ({})",
//!     result.quality_assessment.overall.score, result.quality_assessment.overall.grade
//! );
//!
//! let validation = processor.validate_quality(
//!     &result.quality_assessment,
//!     &QualityThresholds::lenient(),
//! );
//! for failure in &validation.failures {
//!     println!("{}", failure.message);
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Key Features
//!
//! ### Cleaning
//!
//! - **Required fields**: records missing one are dropped and counted
//! - **Imputation**: mean, median, linear interpolation or zero fill
//! - **Outliers**: IQR, z-score or modified z-score, applied across all numeric fields at once
//! - **Strict mode**: reject non-numeric values in numeric fields instead of treating them as missing
//!
//! ### Quality Scoring
//!
//! - Completeness, accuracy, consistency, validity, uniqueness and timeliness
//! - Configurable weights and an A to F grade
//! - Recommendations for every dimension below the threshold
//! - Threshold validation with failures and near-miss warnings
//!
//! ### Analysis
//!
//! - Descriptive statistics with interpolated percentiles, skewness and excess kurtosis
//! - Anomalies graded low/medium/high by method-specific deviation
//! - Volatility over per-year means, least-squares trend strength, Pearson correlations
//!
//! ## Configuration
//!
//! Options deserialize from camelCase JSON and reject unknown keys:
//!
//! ```rust
//! use fiscal_guard::config::ProcessingOptions;
//!
//! let options = ProcessingOptions::from_json_str(
//!     r#"{"numericFields": ["gdp"], "cleaning": {"missingValueStrategy": "interpolate"}}"#,
//! );
//! assert!(options.is_ok());
//! assert!(ProcessingOptions::from_json_str(r#"{"numericField": ["gdp"]}"#).is_err());
//! ```
//!
//! ## Logging
//!
//! The library emits `tracing` events and never installs a subscriber. Use
//! [`logging::setup::init_logging`] or your own subscriber:
//!
//! ```rust,no_run
//! use fiscal_guard::logging::setup::{init_logging, LoggingConfig};
//!
//! init_logging(LoggingConfig::development()).unwrap();
//! ```

pub mod analyzers;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod record;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
