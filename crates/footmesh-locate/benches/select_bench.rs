//! Benchmarks for neighbor selection and estimation
//!
//! Measures:
//! - Two-phase best-K selection against a full sort
//! - One full locate pass over a populated directory

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use footmesh_locate::{
    by_rank, Locator, LocatorConfig, NeighborRecord, PeerDirectory, PeerToken, Point, Ranked,
    ScoreWeights,
};

fn directory(size: u32) -> PeerDirectory {
    (0..size)
        .map(|i| {
            let f = i as f64;
            let mut r = NeighborRecord::player(PeerToken(i), Point::new((f * 7.3) % 122.0, (f * 3.1) % 90.0));
            r.update_signal_strength(-60.0 + (f * 1.7) % 30.0);
            r.update_signal_strength(-60.0 + (f * 2.3) % 30.0);
            r.battery_level = 100.0 - (f * 13.0) % 100.0;
            r.distance_from_me = 1.0 + (f * 5.9) % 80.0;
            r
        })
        .collect()
}

/// Two-phase selection at different directory sizes
fn bench_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k");
    let weights = ScoreWeights::default();

    for &size in &[11u32, 100, 1_000, 10_000] {
        let dir = directory(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("partial", size), &dir, |b, dir| {
            b.iter(|| footmesh_locate::rank_top_k(black_box(dir.as_slice()), &weights, 5))
        });
        group.bench_with_input(BenchmarkId::new("full_sort", size), &dir, |b, dir| {
            b.iter(|| {
                let mut ranked: Vec<Ranked> = black_box(dir.as_slice())
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i, weights.score(r)))
                    .collect();
                ranked.sort_by(by_rank);
                ranked.truncate(5);
                ranked
            })
        });
    }
    group.finish();
}

/// A complete select + estimate pass
fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate");
    let locator = Locator::new(LocatorConfig {
        best_k: 5,
        ..LocatorConfig::default()
    })
    .expect("valid config");

    for &size in &[11u32, 100, 1_000] {
        let dir = directory(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &dir, |b, dir| {
            b.iter(|| locator.locate_directory(black_box(dir), Point::ORIGIN))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_top_k, bench_locate);
criterion_main!(benches);
