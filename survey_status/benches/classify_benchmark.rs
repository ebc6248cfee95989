use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use survey_status::models::{Exposure, Field};
use survey_status::services::{label_fields, select_good_exposures};
use survey_status::QualityPolicy;

const BANDS: [&str; 3] = ["g", "r", "i"];
const PROGRAMS: [&str; 3] = ["delve-wide", "delve-mc", "delve-deep"];

fn synthetic_exposures(n: usize) -> Vec<Exposure> {
    let start = NaiveDate::from_ymd_opt(2019, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let band = BANDS[i % 3];
            Exposure {
                object: format!("DELVE field: {}-{:02}-{}", i / 3, i % 3 + 1, band),
                program: PROGRAMS[(i / 7) % 3].to_string(),
                filter: band.to_string(),
                exptime: 90.0,
                date: start + chrono::Duration::minutes(i as i64),
                qc_teff: if i % 11 == 0 { -1.0 } else { (i % 10) as f64 / 10.0 },
                qc_fwhm: 0.8 + (i % 15) as f64 / 10.0,
                ra: None,
                dec: None,
            }
        })
        .collect()
}

fn synthetic_fields(n: usize) -> Vec<Field> {
    (0..n)
        .map(|i| {
            Field::from_catalog(
                (i / 3) as i64,
                (i % 3 + 1) as i64,
                PROGRAMS[(i / 7) % 3],
                BANDS[i % 3],
                [1, -1, 4][i % 3],
                (i % 360) as f64,
                -30.0,
            )
        })
        .collect()
}

fn bench_select_good(c: &mut Criterion) {
    let policy = QualityPolicy::delve();
    let mut group = c.benchmark_group("select_good_exposures");
    for n in [1_000usize, 100_000] {
        let exposures = synthetic_exposures(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &exposures, |b, input| {
            b.iter(|| black_box(select_good_exposures(black_box(input), &policy)));
        });
    }
    group.finish();
}

fn bench_label_fields(c: &mut Criterion) {
    let policy = QualityPolicy::delve();
    let exposures = synthetic_exposures(50_000);
    let fields = synthetic_fields(30_000);

    c.bench_function("label_fields_30k", |b| {
        b.iter(|| black_box(label_fields(&fields, &exposures, &policy)));
    });
}

criterion_group!(benches, bench_select_good, bench_label_fields);
criterion_main!(benches);
