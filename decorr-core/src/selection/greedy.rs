//! Greedy single-pass selection of mutually uncorrelated assets.
//!
//! Candidates are consumed once, left to right, and never revisited. A
//! candidate is accepted iff its absolute correlation with every asset
//! already selected is strictly below the threshold. The scan completes when
//! the target size is reached or the universe is exhausted. There is no
//! backtracking, so the result depends on universe order.

use crate::correlation::correlation;
use crate::domain::{AssetId, SeriesSet};
use std::cmp::Ordering;

/// Select up to `target_size` assets whose pairwise `|correlation|` is below
/// `threshold`, correlating price series with the Pearson engine.
///
/// A `target_size` of zero or less yields an empty selection.
pub fn select_uncorrelated(
    universe: &[AssetId],
    series: &SeriesSet,
    target_size: i64,
    threshold: f64,
) -> Vec<AssetId> {
    select_uncorrelated_by(universe, target_size, threshold, |a, b| {
        correlation(series.get_or_empty(a.as_str()), series.get_or_empty(b.as_str()))
    })
}

/// Greedy selection with a caller-supplied correlation lookup.
///
/// `corr(candidate, selected)` is called at most once per candidate and
/// selected asset; the scan of a candidate stops at the first selected asset
/// it is too correlated with.
pub fn select_uncorrelated_by<F>(
    universe: &[AssetId],
    target_size: i64,
    threshold: f64,
    mut corr: F,
) -> Vec<AssetId>
where
    F: FnMut(&AssetId, &AssetId) -> f64,
{
    let target = match usize::try_from(target_size) {
        Ok(t) if t > 0 => t,
        _ => return Vec::new(),
    };

    let mut selected: Vec<AssetId> = Vec::with_capacity(target.min(universe.len()));

    for candidate in universe {
        if selected.len() >= target {
            break;
        }

        // Only strictly-below passes; a NaN on either side never does.
        let blocker = selected.iter().find(|chosen| {
            corr(candidate, *chosen).abs().partial_cmp(&threshold) != Some(Ordering::Less)
        });

        match blocker {
            None => {
                tracing::debug!(asset = %candidate, "accepted");
                selected.push(candidate.clone());
            }
            Some(chosen) => {
                tracing::debug!(asset = %candidate, correlated_with = %chosen, "rejected");
            }
        }
    }

    selected
}
