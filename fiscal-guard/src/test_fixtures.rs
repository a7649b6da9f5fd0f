//! Common test fixtures for spending and GDP processing scenarios.
//!
//! This module provides pre-built country-year record sets used across unit
//! tests, integration tests and benchmarks: a small deterministic panel with
//! known defects, and a seeded generator for larger datasets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{CleaningConfig, MissingValueStrategy, OutlierMethod, ProcessingOptions};
use crate::record::{FieldValue, Record};

/// Countries in the fixture panel with their spending and GDP baselines.
pub const FIXTURE_COUNTRIES: [(&str, f64, f64); 5] = [
    ("FRA", 1500.0, 2800.0),
    ("DEU", 1900.0, 3900.0),
    ("ITA", 1100.0, 2100.0),
    ("ESP", 600.0, 1400.0),
    ("NLD", 450.0, 1000.0),
];

/// Years in the fixture panel.
pub const FIXTURE_YEARS: [i32; 4] = [2019, 2020, 2021, 2022];

/// Position of the record whose `totalSpending` is null in [`scenario_records`].
pub const SCENARIO_MISSING_INDEX: usize = 6;

/// Position of the record holding the extreme outlier in [`scenario_records`].
pub const SCENARIO_OUTLIER_INDEX: usize = 11;

/// 20 clean country-year records (5 countries x 4 years).
///
/// Spending and GDP grow 2% and 3% a year from each country's baseline.
pub fn country_year_records() -> Vec<Record> {
    let mut records = Vec::with_capacity(FIXTURE_COUNTRIES.len() * FIXTURE_YEARS.len());
    for (country, spending, gdp) in FIXTURE_COUNTRIES {
        for (t, year) in FIXTURE_YEARS.into_iter().enumerate() {
            let t = t as f64;
            records.push(
                Record::new()
                    .with("country", country)
                    .with("year", year)
                    .with("totalSpending", round2(spending * (1.0 + 0.02 * t)))
                    .with("gdp", round2(gdp * (1.0 + 0.03 * t))),
            );
        }
    }
    records
}

/// The panel with one null `totalSpending` and one value 1000x the median.
pub fn scenario_records() -> Vec<Record> {
    let mut records = country_year_records();
    let median = crate::analyzers::statistics::median(
        &crate::record::numeric_sample(&records, "totalSpending"),
    )
    .unwrap_or(1000.0);
    records[SCENARIO_MISSING_INDEX].set("totalSpending", FieldValue::Null);
    records[SCENARIO_OUTLIER_INDEX].set("totalSpending", median * 1000.0);
    records
}

/// Options for the scenario: outlier removal by IQR, median imputation.
pub fn scenario_options() -> ProcessingOptions {
    ProcessingOptions::new()
        .with_required_fields(["country", "year"])
        .with_numeric_fields(["totalSpending", "gdp"])
        .with_cleaning(
            CleaningConfig::default()
                .with_remove_outliers(true)
                .with_fill_missing_values(true)
                .with_outlier_method(OutlierMethod::Iqr)
                .with_missing_value_strategy(MissingValueStrategy::Median),
        )
}

/// Records with a `country` key and one numeric field taken from `values`.
pub fn single_field_records(field: &str, values: &[Option<f64>]) -> Vec<Record> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let value = v.map_or(FieldValue::Null, FieldValue::from);
            Record::new().with("country", format!("C{i}")).with(field, value)
        })
        .collect()
}

/// Settings for generated datasets.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub countries: usize,
    pub years: usize,
    pub first_year: i32,
    /// Probability of a null numeric value
    pub missing_rate: f64,
    /// Probability of a value multiplied into outlier territory
    pub outlier_rate: f64,
    /// Probability of a non-numeric string in a numeric field
    pub invalid_rate: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            countries: 20,
            years: 10,
            first_year: 2010,
            missing_rate: 0.05,
            outlier_rate: 0.01,
            invalid_rate: 0.0,
        }
    }
}

/// Generates a reproducible country-year panel.
///
/// Fields: `country`, `year`, `totalSpending`, `gdp`, `debt`. Defects are
/// injected per value according to the configured rates.
pub fn generate_records(config: &GeneratorConfig, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(config.countries * config.years);

    for c in 0..config.countries {
        let country = format!("C{c:03}");
        let spending_base = rng.random_range(100.0..2000.0);
        let gdp_base = spending_base * rng.random_range(1.5..3.0);
        let debt_base = gdp_base * rng.random_range(0.3..1.2);
        let growth = rng.random_range(-0.01..0.05);

        for t in 0..config.years {
            let drift = 1.0 + growth * t as f64;
            let mut record = Record::new()
                .with("country", country.as_str())
                .with("year", config.first_year + t as i32);
            for (field, base) in [
                ("totalSpending", spending_base),
                ("gdp", gdp_base),
                ("debt", debt_base),
            ] {
                let noise = 1.0 + rng.random_range(-0.03..0.03);
                record.set(field, defect(&mut rng, config, round2(base * drift * noise)));
            }
            records.push(record);
        }
    }
    records
}

fn defect(rng: &mut StdRng, config: &GeneratorConfig, value: f64) -> FieldValue {
    if rng.random_bool(config.missing_rate) {
        FieldValue::Null
    } else if rng.random_bool(config.invalid_rate) {
        FieldValue::from("n/a")
    } else if rng.random_bool(config.outlier_rate) {
        FieldValue::from(value * 500.0)
    } else {
        FieldValue::from(value)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
