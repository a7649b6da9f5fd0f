//! Integration tests for the data cleaner across strategies and methods.

use fiscal_guard::config::{
    CleaningConfig, MissingValueStrategy, OutlierAction, OutlierMethod, ProcessingOptions,
};
use fiscal_guard::core::DataCleaner;
use fiscal_guard::error::FiscalError;
use fiscal_guard::record::{FieldValue, NumericValue};
use fiscal_guard::test_fixtures::{
    country_year_records, scenario_options, scenario_records, single_field_records,
    SCENARIO_OUTLIER_INDEX,
};

fn spending_cleaner(config: CleaningConfig) -> DataCleaner {
    DataCleaner::new(config)
        .with_required_fields(vec!["country".to_string()])
        .with_numeric_fields(vec!["spending".to_string()])
}

fn values(records: &[fiscal_guard::record::Record]) -> Vec<Option<f64>> {
    records.iter().map(|r| r.numeric("spending").as_f64()).collect()
}

#[test]
fn test_imputation_strategies() {
    let input = single_field_records("spending", &[Some(1.0), None, Some(3.0)]);

    let mean = spending_cleaner(
        CleaningConfig::default().with_missing_value_strategy(MissingValueStrategy::Mean),
    )
    .clean(&input)
    .unwrap();
    assert_eq!(values(&mean.records), vec![Some(1.0), Some(2.0), Some(3.0)]);

    let zero = spending_cleaner(
        CleaningConfig::default().with_missing_value_strategy(MissingValueStrategy::Zero),
    )
    .clean(&input)
    .unwrap();
    assert_eq!(values(&zero.records), vec![Some(1.0), Some(0.0), Some(3.0)]);

    let interpolated = spending_cleaner(
        CleaningConfig::default().with_missing_value_strategy(MissingValueStrategy::Interpolate),
    )
    .clean(&single_field_records(
        "spending",
        &[None, Some(10.0), None, None, Some(40.0), None],
    ))
    .unwrap();
    assert_eq!(
        values(&interpolated.records),
        vec![Some(10.0), Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(40.0)]
    );
    assert_eq!(interpolated.report.imputed_value_count, 4);
}

#[test]
fn test_report_invariant_across_methods() {
    let input = scenario_records();
    for method in [
        OutlierMethod::Iqr,
        OutlierMethod::ZScore,
        OutlierMethod::ModifiedZScore,
    ] {
        let options = scenario_options().with_cleaning(
            CleaningConfig::default()
                .with_remove_outliers(true)
                .with_outlier_method(method),
        );
        let cleaned = DataCleaner::from_options(&options).clean(&input).unwrap();
        let report = &cleaned.report;
        assert_eq!(
            report.cleaned_count + report.removed_count,
            report.original_count,
            "{method}"
        );
        assert_eq!(report.cleaned_count, cleaned.records.len());
    }
}

#[test]
fn test_zscore_flags_scenario_outlier() {
    // one extreme value among 20 reaches |z| close to 19 / sqrt(20)
    let options = scenario_options().with_cleaning(
        CleaningConfig::default()
            .with_remove_outliers(true)
            .with_outlier_method(OutlierMethod::ZScore),
    );
    let cleaned = DataCleaner::from_options(&options)
        .clean(&scenario_records())
        .unwrap();
    assert_eq!(cleaned.report.outlier_count, 1);
    assert_eq!(cleaned.report.field_outliers.get("totalSpending"), Some(&1));
}

#[test]
fn test_outlier_in_non_required_field_can_be_nulled() {
    let options = scenario_options().with_cleaning(
        CleaningConfig::default()
            .with_remove_outliers(true)
            .with_non_required_outlier_action(OutlierAction::NullField),
    );
    let cleaned = DataCleaner::from_options(&options)
        .clean(&scenario_records())
        .unwrap();
    assert_eq!(cleaned.report.outlier_count, 1);
    assert_eq!(cleaned.report.removed_count, 0);
    assert_eq!(
        cleaned.records[SCENARIO_OUTLIER_INDEX].get("totalSpending"),
        Some(&FieldValue::Null)
    );
}

#[test]
fn test_mixed_defects() {
    let mut input = country_year_records();
    input[0].set("country", FieldValue::Null);
    input[1].set("gdp", "unknown");
    input[2].set("gdp", FieldValue::Null);
    let options = ProcessingOptions::new()
        .with_required_fields(["country", "year"])
        .with_numeric_fields(["totalSpending", "gdp"]);

    let cleaned = DataCleaner::from_options(&options).clean(&input).unwrap();
    let report = &cleaned.report;
    assert_eq!(report.missing_required_count, 1);
    assert_eq!(report.removed_count, 1);
    assert_eq!(report.missing_value_count, 2);
    assert_eq!(report.invalid_value_count, 1);
    assert_eq!(report.imputed_value_count, 2);
    assert!(cleaned
        .records
        .iter()
        .all(|r| matches!(r.numeric("gdp"), NumericValue::Present(_))));
}

#[test]
fn test_empty_input() {
    let err = DataCleaner::new(CleaningConfig::default())
        .clean(&[])
        .unwrap_err();
    assert!(matches!(err, FiscalError::EmptyInput));
}
