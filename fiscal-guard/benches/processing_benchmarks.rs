//! Benchmarks for the processing pipeline on generated country-year panels.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fiscal_guard::analyzers::correlation::correlation_matrix;
use fiscal_guard::analyzers::outliers::detect_record_outliers;
use fiscal_guard::config::{CleaningConfig, OutlierMethod, ProcessingOptions, QualityConfig};
use fiscal_guard::core::{DataCleaner, DataProcessor, QualityAssessor};
use fiscal_guard::test_fixtures::{generate_records, GeneratorConfig};
use std::hint::black_box;
use std::time::Duration;

const SEED: u64 = 42;

fn panel(countries: usize) -> Vec<fiscal_guard::record::Record> {
    let config = GeneratorConfig {
        countries,
        years: 20,
        invalid_rate: 0.01,
        ..GeneratorConfig::default()
    };
    generate_records(&config, SEED)
}

fn options(method: OutlierMethod) -> ProcessingOptions {
    ProcessingOptions::new()
        .with_required_fields(["country", "year"])
        .with_numeric_fields(["totalSpending", "gdp", "debt"])
        .with_quality(QualityConfig::default().with_reference_year(2030))
        .with_cleaning(
            CleaningConfig::default()
                .with_remove_outliers(true)
                .with_outlier_method(method),
        )
}

fn bench_process_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_data");
    group.measurement_time(Duration::from_secs(10));

    for countries in [10, 100, 500] {
        let records = panel(countries);
        let options = options(OutlierMethod::Iqr);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(records.len()),
            &records,
            |b, records| {
                let processor = DataProcessor::new();
                b.iter(|| processor.process_data(black_box(records), black_box(&options)));
            },
        );
    }

    group.finish();
}

fn bench_cleaning_methods(c: &mut Criterion) {
    let records = panel(100);
    let mut group = c.benchmark_group("clean");

    for method in [
        OutlierMethod::Iqr,
        OutlierMethod::ZScore,
        OutlierMethod::ModifiedZScore,
    ] {
        let cleaner = DataCleaner::from_options(&options(method));
        group.bench_function(BenchmarkId::from_parameter(method), |b| {
            b.iter(|| cleaner.clean(black_box(&records)));
        });
    }

    group.finish();
}

fn bench_analyzers(c: &mut Criterion) {
    let records = panel(200);
    let fields: Vec<String> = ["totalSpending", "gdp", "debt"]
        .iter()
        .map(|f| f.to_string())
        .collect();
    let assessor = QualityAssessor::from_options(&options(OutlierMethod::Iqr));

    c.bench_function("quality_assessment", |b| {
        b.iter(|| assessor.assess(black_box(&records), None));
    });
    c.bench_function("correlation_matrix", |b| {
        b.iter(|| correlation_matrix(black_box(&records), black_box(&fields)));
    });
    c.bench_function("detect_record_outliers", |b| {
        b.iter(|| detect_record_outliers(black_box(&records), "gdp", OutlierMethod::ModifiedZScore));
    });
}

criterion_group!(
    benches,
    bench_process_data,
    bench_cleaning_methods,
    bench_analyzers
);
criterion_main!(benches);
