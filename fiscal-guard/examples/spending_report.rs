//! Example demonstrating a full processing run over spending and GDP records.
//!
//! Builds a small country-year panel with a missing value, a typo and a
//! unit error, runs the processor and prints the cleaning summary, the
//! quality grade, anomalies and correlations.

use fiscal_guard::logging::setup::{init_logging, LoggingConfig};
use fiscal_guard::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::development())?;

    let panel = [
        ("FRA", [1480.0, 1510.0, 1530.0, 1560.0], [2780.0, 2850.0, 2920.0, 3010.0]),
        ("DEU", [1890.0, 1950.0, 2000.0, 2040.0], [3870.0, 3990.0, 4080.0, 4150.0]),
        ("ITA", [1090.0, 1120.0, 1150.0, 1170.0], [2090.0, 2150.0, 2200.0, 2240.0]),
        ("ESP", [600.0, 615.0, 630.0, 650.0], [1400.0, 1440.0, 1490.0, 1530.0]),
    ];

    let mut records = Vec::new();
    for (country, spending, gdp) in panel {
        for (i, year) in (2019..2023).enumerate() {
            records.push(
                Record::new()
                    .with("country", country)
                    .with("year", year)
                    .with("totalSpending", spending[i])
                    .with("gdp", gdp[i]),
            );
        }
    }
    records[5].set("totalSpending", FieldValue::Null);
    records[9].set("gdp", "2,150");
    // reported in millions instead of billions
    records[14].set("totalSpending", 630_000.0);

    let options = ProcessingOptions::new()
        .with_required_fields(["country", "year"])
        .with_numeric_fields(["totalSpending", "gdp"])
        .with_cleaning(
            CleaningConfig::default()
                .with_remove_outliers(true)
                .with_missing_value_strategy(MissingValueStrategy::Interpolate),
        );

    let processor = DataProcessor::new();
    let result = processor.process_data(&records, &options)?;

    let report = &result.cleaning_report;
    println!(
        "Cleaned {} of {} records ({} removed, {} imputed, {} invalid)",
        report.cleaned_count,
        report.original_count,
        report.removed_count,
        report.imputed_value_count,
        report.invalid_value_count
    );

    let quality = &result.quality_assessment;
    println!(
        "Quality {:.1} (grade {})",
        quality.overall.score, quality.overall.grade
    );
    for (dimension, score) in quality.dimensions.iter() {
        println!("  {dimension:<13} {score:>6.1}");
    }
    for recommendation in &quality.recommendations {
        println!("  - {recommendation}");
    }

    for anomaly in &result.anomalies.anomalies {
        println!(
            "Anomaly [{:?}] {} = {}: {}",
            anomaly.severity, anomaly.field, anomaly.value, anomaly.reason
        );
    }

    for pair in &result.advanced_metrics.correlations {
        println!(
            "{} ~ {}: r = {:.3} ({})",
            pair.field_a,
            pair.field_b,
            pair.coefficient,
            pair.strength.label()
        );
    }

    let validation = processor.validate_quality(quality, &QualityThresholds::default());
    println!("Validation passed: {}", validation.passed);
    for issue in validation.failures.iter().chain(&validation.warnings) {
        println!("  {}", issue.message);
    }

    Ok(())
}
