//! Criterion benchmarks for the correlation hot paths.
//!
//! Benchmarks:
//! 1. Pearson correlation over a single pair (hourly series of varying length)
//! 2. Matrix construction over a universe (N(N-1)/2 pairs)
//! 3. Top-K ranking of a full matrix
//! 4. Greedy uncorrelated-set selection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use decorr_core::correlation::{build_matrix, correlation};
use decorr_core::data::synthetic_series;
use decorr_core::domain::{AssetId, SeriesSet};
use decorr_core::selection::{select_uncorrelated, top_k};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_universe(assets: usize, points: usize) -> (Vec<AssetId>, SeriesSet) {
    let ids: Vec<AssetId> = (0..assets)
        .map(|i| AssetId::new(format!("coin-{i}")))
        .collect();
    let series = ids
        .iter()
        .map(|id| (id.clone(), synthetic_series(id, points)))
        .collect();
    (ids, series)
}

// ── 1. Single Pair ───────────────────────────────────────────────────

fn bench_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("pearson_pair");

    // 30 days, 90 days, 1 year of hourly points
    for &points in &[720, 2160, 8760] {
        let a = synthetic_series(&AssetId::new("left"), points);
        let b = synthetic_series(&AssetId::new("right"), points);

        group.bench_with_input(BenchmarkId::new("hourly", points), &points, |bench, _| {
            bench.iter(|| correlation(black_box(a.as_slice()), black_box(b.as_slice())));
        });
    }

    group.finish();
}

// ── 2. Matrix ────────────────────────────────────────────────────────

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix");
    group.sample_size(20);

    for &assets in &[10, 50, 100] {
        let (ids, series) = make_universe(assets, 720);

        group.bench_with_input(BenchmarkId::new("assets", assets), &assets, |b, _| {
            b.iter(|| build_matrix(black_box(&ids), black_box(&series)));
        });
    }

    group.finish();
}

// ── 3. Top-K ─────────────────────────────────────────────────────────

fn bench_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k");

    let (ids, series) = make_universe(100, 720);
    let matrix = build_matrix(&ids, &series);

    group.bench_function("k46_of_4950", |b| {
        b.iter(|| top_k(black_box(matrix.pairs()), black_box(46)));
    });

    group.finish();
}

// ── 4. Greedy ────────────────────────────────────────────────────────

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_selection");

    for &assets in &[10, 50, 100] {
        let (ids, series) = make_universe(assets, 720);

        group.bench_with_input(BenchmarkId::new("target_5", assets), &assets, |b, _| {
            b.iter(|| select_uncorrelated(black_box(&ids), black_box(&series), 5, 0.2));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pair, bench_matrix, bench_top_k, bench_greedy);
criterion_main!(benches);
