use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moto_maintenance::models::{parse_bike_details, RawBikeDetails};
use moto_maintenance::services::{build_details_view, evaluate_status, group_by_year};
use serde_json::Value;
use std::fs;

fn benchmark_bike_details(c: &mut Criterion) {
    // Load the realistic aggregate fixture
    let fixture_content =
        fs::read_to_string("tests/fixtures/bike_details.json").expect("Failed to read fixture");
    let fixture_json: Value =
        serde_json::from_str(&fixture_content).expect("Failed to parse fixture");
    let raw: RawBikeDetails =
        serde_json::from_value(fixture_json.clone()).expect("Failed to decode fixture");
    let aggregate = parse_bike_details(raw.clone())
        .expect("Failed to parse aggregate")
        .aggregate;
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");

    // A long-owned bike: the same history repeated over many years
    let mut long_timeline = Vec::new();
    for year in (1990..2025).rev() {
        for entry in &aggregate.timeline {
            let mut entry = entry.clone();
            entry.occurred_year = Some(year);
            long_timeline.push(entry);
        }
    }

    let mut group = c.benchmark_group("bike_details");

    group.bench_function("parse_payload", |b| {
        b.iter(|| parse_bike_details(black_box(raw.clone())))
    });

    group.bench_function("evaluate_services", |b| {
        b.iter(|| {
            aggregate
                .services
                .iter()
                .map(|s| evaluate_status(black_box(s), aggregate.bike.odometer_km, today))
                .count()
        })
    });

    group.bench_function("group_long_timeline", |b| {
        b.iter(|| group_by_year(black_box(&long_timeline)))
    });

    group.bench_function("build_view", |b| {
        b.iter(|| build_details_view(black_box(&aggregate), today))
    });

    group.finish();
}

criterion_group!(benches, benchmark_bike_details);
criterion_main!(benches);
