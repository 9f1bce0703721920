//! Benchmarks for the CarLog stats engine
//!
//! Run with: cargo bench

use carlog::stats::{aggregate, predecessor_of, sort_records, RecordRef};
use carlog::store::FuelRecord;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use uuid::Uuid;

const DAY_MS: i64 = 24 * 3600 * 1000;

fn create_test_records(count: usize) -> Vec<FuelRecord> {
    let vehicle_id = Uuid::new_v4();
    (0..count)
        .map(|i| {
            let mut record = FuelRecord::new(
                vehicle_id,
                1_700_000_000_000 + (i as i64 / 3) * DAY_MS, // a few same-day ties
                1000.0 + i as f64 * 310.0,
                11.0,
                46.0,
            )
            .trip(310.0)
            .fuel_economy(11.0 / 310.0);
            record.created_at = 1_700_000_000_000 + i as i64;
            record
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [10, 100, 1000] {
        let records = create_test_records(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("vehicle_stats_{}", size), |b| {
            b.iter(|| aggregate(black_box(&records)))
        });
    }

    group.finish();
}

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordering");

    for size in [100, 1000] {
        let records = create_test_records(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("sort_{}", size), |b| {
            b.iter_batched(
                || records.clone(),
                |mut records| sort_records(black_box(&mut records)),
                criterion::BatchSize::SmallInput,
            )
        });

        let reference = RecordRef::New {
            date: 1_700_000_000_000 + (size as i64) * DAY_MS,
        };
        group.bench_function(format!("predecessor_{}", size), |b| {
            b.iter(|| predecessor_of(black_box(&records), black_box(&reference)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_ordering);
criterion_main!(benches);
