use aqs_pipeline::models::{MergedTable, RawRecord};
use aqs_pipeline::processors::{
    FrequencyRegularizer, IntegrityChecker, RecordNormalizer, Resampler, SectorAggregator, SeriesAligner,
};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// Hourly records for `days` days, reporting every `every` hours
fn create_records(days: usize, every: usize) -> Vec<RawRecord> {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    (0..days * 24)
        .step_by(every)
        .map(|h| {
            let instant = start + Duration::hours(h as i64);
            RawRecord::new(
                &instant.format("%Y-%m-%d").to_string(),
                &instant.format("%H:%M").to_string(),
                Some(20.0 + (h % 24) as f64 * 0.5),
                34.06659,
                -118.22688,
                Some("087"),
            )
        })
        .collect()
}

fn benchmark_normalize(c: &mut Criterion) {
    let records = create_records(365, 1);
    let normalizer = RecordNormalizer::new();

    c.bench_function("normalize_one_year", |b| {
        b.iter(|| normalizer.normalize(black_box(&records), "Ozone").unwrap())
    });
}

fn benchmark_align_and_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("align_resample");
    let normalizer = RecordNormalizer::new();
    let regularizer = FrequencyRegularizer::hourly();

    for days in [30, 365].iter() {
        let series: Vec<_> = [1, 3, 6]
            .iter()
            .enumerate()
            .map(|(i, every)| {
                let normalized = normalizer
                    .normalize(&create_records(*days, *every), &format!("var_{}", i))
                    .unwrap()
                    .unwrap();
                regularizer.regularize(normalized).unwrap()
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("days", days), &series, |b, series| {
            b.iter(|| {
                let table = SeriesAligner::new().align(black_box(series)).unwrap();
                Resampler::new().resample(&table).unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_sector_aggregation(c: &mut Criterion) {
    let compounds: Vec<String> = (0..20).map(|i| format!("voc{}", i)).collect();
    let columns: Vec<String> = compounds
        .iter()
        .flat_map(|compound| (0..8).map(move |s| format!("{}_{}", compound, s)))
        .collect();

    let mut table = MergedTable::new(columns.clone()).unwrap();
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    for h in 0..24 * 30 {
        let row = (0..columns.len()).map(|c| Some((c + h) as f64 * 0.1)).collect();
        table.push_row(start + Duration::hours(h as i64), row).unwrap();
    }

    c.bench_function("sector_aggregation", |b| {
        b.iter(|| SectorAggregator::new().aggregate(black_box(&table), &compounds).unwrap())
    });
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let normalized = RecordNormalizer::new()
        .normalize(&create_records(365, 1), "Ozone")
        .unwrap()
        .unwrap();
    let table = SeriesAligner::new().align(&[normalized]).unwrap();

    c.bench_function("integrity_checker", |b| {
        b.iter(|| {
            let checker = IntegrityChecker::new();
            checker.check_table(black_box(&table))
        })
    });
}

criterion_group!(
    benches,
    benchmark_normalize,
    benchmark_align_and_resample,
    benchmark_sector_aggregation,
    benchmark_integrity_checker
);
criterion_main!(benches);
