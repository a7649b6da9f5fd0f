//! Integration tests for quality assessment and threshold validation.

use fiscal_guard::config::{QualityConfig, QualityThresholds, QualityWeights};
use fiscal_guard::core::{
    CleaningReport, DataProcessor, Grade, QualityAssessor, QualityDimension,
};
use fiscal_guard::record::{FieldValue, Record};
use fiscal_guard::test_fixtures::country_year_records;

fn assessor(reference_year: i32) -> QualityAssessor {
    QualityAssessor::new(QualityConfig::default().with_reference_year(reference_year))
        .with_required_fields(vec!["country".to_string(), "year".to_string()])
        .with_numeric_fields(vec!["totalSpending".to_string(), "gdp".to_string()])
}

#[test]
fn test_clean_panel_grades_a() {
    let assessment = assessor(2023).assess(&country_year_records(), None);
    assert_eq!(assessment.overall.grade, Grade::A);
    assert!((assessment.overall.score - 100.0).abs() < 1e-9);
    assert!(assessment.recommendations.is_empty());
    assert_eq!(assessment.field_analysis.len(), 4);
    assert!(assessment.field_analysis["gdp"].inferred_type.is_numeric());
}

#[test]
fn test_scores_stay_in_range_for_degraded_data() {
    let mut records = country_year_records();
    for record in records.iter_mut().step_by(2) {
        record.set("gdp", "n/a");
    }
    records[1].set("country", FieldValue::Null);
    records.push(records[3].clone());
    records.push(Record::new().with("note", "orphan"));

    let assessment = assessor(2040).assess(&records, None);
    for (dimension, score) in assessment.dimensions.iter() {
        assert!((0.0..=100.0).contains(&score), "{dimension} = {score}");
    }
    assert!((0.0..=100.0).contains(&assessment.overall.score));
    assert_eq!(
        assessment.overall.grade,
        Grade::from_score(assessment.overall.score)
    );
    assert_eq!(assessment.duplicate_records, 1);
    assert!(assessment.dimensions.validity < 50.0);
    assert!(!assessment.recommendations.is_empty());
}

#[test]
fn test_outlier_removal_reduces_accuracy() {
    let records = country_year_records();
    let without = assessor(2023).assess(&records, None);
    let report = CleaningReport {
        outlier_value_count: 2,
        ..CleaningReport::default()
    };
    let with = assessor(2023).assess(&records, Some(&report));
    assert!(with.dimensions.accuracy < without.dimensions.accuracy);
    // 40 checked values, 2 removed
    assert!((with.dimensions.accuracy - 40.0 / 42.0 * 100.0).abs() < 1e-9);
}

#[test]
fn test_custom_weights_shift_overall() {
    let records = country_year_records();
    let timeliness_only = QualityWeights {
        completeness: 0.0,
        accuracy: 0.0,
        consistency: 0.0,
        validity: 0.0,
        uniqueness: 0.0,
        timeliness: 1.0,
    };
    let assessment = QualityAssessor::new(
        QualityConfig::default()
            .with_reference_year(2027)
            .with_weights(timeliness_only),
    )
    .assess(&records, None);
    // lag 5 years
    assert!((assessment.overall.score - 60.0).abs() < 1e-9);
    assert_eq!(assessment.overall.grade, Grade::D);
}

#[test]
fn test_validation_profiles() {
    let mut records = country_year_records();
    records[0].set("country", FieldValue::Null);
    records[1].set("country", FieldValue::Null);
    records[2].set("country", FieldValue::Null);
    let assessment = assessor(2023).assess(&records, None);
    // completeness (85 + 100) / 2 = 92.5, validity 85
    let processor = DataProcessor::new();

    let default = processor.validate_quality(&assessment, &QualityThresholds::default());
    assert!(default.passed);
    assert!(default
        .warnings
        .iter()
        .any(|w| w.dimension == QualityDimension::Validity.name()));

    let strict = processor.validate_quality(&assessment, &QualityThresholds::strict());
    assert!(!strict.passed);
    assert!(strict.failures.iter().any(|f| f.dimension == "validity"));

    let lenient = processor.validate_quality(&assessment, &QualityThresholds::lenient());
    assert!(lenient.passed);
    assert!(lenient.warnings.is_empty());
}
