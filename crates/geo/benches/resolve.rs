//! Benchmarks for nearest-facility resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lastmile_geo::{
    haversine_distance, ranking::shortlist, resolve_geodesic, Coordinate, FacilityRecord, FacilitySet, Technology,
};

fn create_towers(count: usize) -> FacilitySet {
    let records = (0..count)
        .map(|i| {
            // Grid of towers around the test area
            let lat = 12.0 + (i as f64 * 0.001) % 1.0;
            let lng = 67.5 + (i as f64 * 0.0007) % 1.0;
            FacilityRecord::new(Coordinate::new(lat, lng))
        })
        .collect();
    FacilitySet::new(Technology::Wireless, records)
}

fn bench_single_distance(c: &mut Criterion) {
    let point = Coordinate::new(12.3450, 67.8900);
    let tower = Coordinate::new(12.3480, 67.8900);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&point), black_box(&tower)))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_geodesic");
    let point = Coordinate::new(12.3450, 67.8900);

    for size in [10, 100, 1000, 10000].iter() {
        let towers = create_towers(*size);
        group.bench_with_input(BenchmarkId::new("scan", size), size, |b, _| {
            b.iter(|| resolve_geodesic(black_box(&point), black_box(&towers)))
        });
    }

    group.finish();
}

fn bench_shortlist(c: &mut Criterion) {
    let mut group = c.benchmark_group("shortlist");
    let point = Coordinate::new(12.3450, 67.8900);

    for size in [100, 1000, 10000].iter() {
        let towers = create_towers(*size);
        group.bench_with_input(BenchmarkId::new("k5", size), size, |b, _| {
            b.iter(|| shortlist(black_box(&point), black_box(&towers), 5))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_resolve, bench_shortlist);
criterion_main!(benches);
