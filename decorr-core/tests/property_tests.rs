//! Property tests for correlation and selection invariants.
//!
//! Uses proptest to verify:
//! 1. Correlation is symmetric, bounded, and finite for any input
//! 2. Degenerate input (constant, empty, mismatched) correlates to exactly 0
//! 3. The matrix builder yields one record per unordered pair
//! 4. Top-K is sorted by |correlation| and has length min(k, n)
//! 5. Greedy selection respects its target size and threshold

use decorr_core::correlation::{build_matrix, correlation, PairRecord};
use decorr_core::domain::{AssetId, SeriesSet};
use decorr_core::selection::{select_uncorrelated, top_k};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (0.01..10_000.0_f64).prop_map(|p| (p * 1000.0).round() / 1000.0)
}

fn arb_series(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), len)
}

fn arb_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..60).prop_flat_map(|n| (arb_series(n), arb_series(n)))
}

fn arb_universe() -> impl Strategy<Value = (Vec<AssetId>, SeriesSet)> {
    (0usize..12, 2usize..30).prop_flat_map(|(assets, len)| {
        prop::collection::vec(arb_series(len), assets).prop_map(|all| {
            let ids: Vec<AssetId> = (0..all.len())
                .map(|i| AssetId::new(format!("asset-{i}")))
                .collect();
            let series: SeriesSet = ids.iter().cloned().zip(all).collect();
            (ids, series)
        })
    })
}

fn has_variance(s: &[f64]) -> bool {
    s.iter().any(|x| *x != s[0])
}

// ── 1. Symmetry, bounds, finiteness ──────────────────────────────────

proptest! {
    #[test]
    fn correlation_is_symmetric((a, b) in arb_pair()) {
        prop_assert_eq!(correlation(&a, &b), correlation(&b, &a));
    }

    #[test]
    fn correlation_is_bounded_and_finite((a, b) in arb_pair()) {
        let r = correlation(&a, &b);
        prop_assert!(r.is_finite());
        prop_assert!(r.abs() <= 1.0 + 1e-12, "out of range: {}", r);
    }

    #[test]
    fn self_correlation_is_one((a, _) in arb_pair()) {
        prop_assume!(has_variance(&a));
        prop_assert!((correlation(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn finite_for_arbitrary_floats(
        a in prop::collection::vec(any::<f64>(), 0..20),
        b in prop::collection::vec(any::<f64>(), 0..20),
    ) {
        prop_assert!(correlation(&a, &b).is_finite());
    }
}

// ── 2. Degenerate input ──────────────────────────────────────────────

proptest! {
    #[test]
    fn constant_series_is_zero(level in arb_price(), (_, b) in arb_pair()) {
        let flat = vec![level; b.len()];
        prop_assert_eq!(correlation(&flat, &b), 0.0);
        prop_assert_eq!(correlation(&b, &flat), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_zero(
        a in prop::collection::vec(arb_price(), 1..30),
        extra in 1usize..5,
    ) {
        let mut b = a.clone();
        b.extend(std::iter::repeat(1.0).take(extra));
        prop_assert_eq!(correlation(&a, &b), 0.0);
        prop_assert_eq!(correlation(&a, &[]), 0.0);
    }
}

// ── 3. Matrix size ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn matrix_has_one_record_per_pair((ids, series) in arb_universe()) {
        let n = ids.len();
        let matrix = build_matrix(&ids, &series);
        prop_assert_eq!(matrix.len(), n * n.saturating_sub(1) / 2);
        prop_assert!(matrix.skipped().is_empty());
    }
}

// ── 4. Top-K ordering ────────────────────────────────────────────────

proptest! {
    #[test]
    fn top_k_is_sorted_and_sized(
        values in prop::collection::vec(-1.0..1.0_f64, 0..60),
        k in 0usize..80,
    ) {
        let pairs: Vec<PairRecord> = values
            .iter()
            .enumerate()
            .map(|(i, c)| PairRecord::new(format!("a{i}"), format!("b{i}"), *c))
            .collect();

        let ranked = top_k(&pairs, k);
        prop_assert_eq!(ranked.len(), k.min(pairs.len()));
        for w in ranked.windows(2) {
            prop_assert!(w[0].correlation.abs() >= w[1].correlation.abs());
        }
    }
}

// ── 5. Greedy selection ──────────────────────────────────────────────

proptest! {
    #[test]
    fn greedy_respects_target_and_threshold(
        (ids, series) in arb_universe(),
        target in -2i64..8,
        threshold in 0.0..1.0_f64,
    ) {
        let picked = select_uncorrelated(&ids, &series, target, threshold);

        prop_assert!(picked.len() as i64 <= target.max(0));
        for (i, x) in picked.iter().enumerate() {
            for y in &picked[i + 1..] {
                let r = correlation(series.get_or_empty(x.as_str()), series.get_or_empty(y.as_str()));
                prop_assert!(r.abs() < threshold);
            }
        }
    }

    #[test]
    fn greedy_preserves_universe_order((ids, series) in arb_universe(), threshold in 0.0..1.0_f64) {
        let picked = select_uncorrelated(&ids, &series, ids.len() as i64, threshold);
        let positions: Vec<usize> = picked
            .iter()
            .map(|p| ids.iter().position(|id| id == p).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
