//! Top-K ranking of pairs by correlation strength.

use crate::correlation::PairRecord;

/// The `k` pairs with the strongest absolute correlation, strongest first.
///
/// The sort is stable, so pairs with equal `|correlation|` keep their input
/// order. Returns every pair when fewer than `k` exist. The input is not
/// modified.
pub fn top_k(pairs: &[PairRecord], k: usize) -> Vec<PairRecord> {
    let mut ranked = pairs.to_vec();
    ranked.sort_by(|x, y| y.abs_correlation().total_cmp(&x.abs_correlation()));
    ranked.truncate(k);
    ranked
}
