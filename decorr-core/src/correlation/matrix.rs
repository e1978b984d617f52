//! Pairwise correlations across a whole universe.
//!
//! Every unordered pair `{i, j}` with `i < j` in universe order is computed
//! once, in `i`-then-`j` order. A pair whose correlation cannot be computed is
//! left out and recorded in [`CorrelationMatrix::skipped`]; one bad pair never
//! aborts the build.

use super::engine::{try_correlation, CorrelationError};
use crate::domain::{AssetId, SeriesSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An unordered pair of assets and their correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub a: AssetId,
    pub b: AssetId,
    pub correlation: f64,
}

impl PairRecord {
    pub fn new(a: impl Into<AssetId>, b: impl Into<AssetId>, correlation: f64) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            correlation,
        }
    }

    /// Whether this record is for `{x, y}` in either order.
    pub fn involves(&self, x: &str, y: &str) -> bool {
        (self.a.as_str() == x && self.b.as_str() == y)
            || (self.a.as_str() == y && self.b.as_str() == x)
    }

    pub fn abs_correlation(&self) -> f64 {
        self.correlation.abs()
    }
}

/// Displays as `a:b`.
impl fmt::Display for PairRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.a, self.b)
    }
}

/// A pair left out of the matrix and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub a: AssetId,
    pub b: AssetId,
    pub reason: CorrelationError,
}

/// Result of [`build_matrix`]: computed pairs in insertion order plus the
/// pairs that were omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pairs: Vec<PairRecord>,
    skipped: Vec<PairFailure>,
}

impl CorrelationMatrix {
    pub fn pairs(&self) -> &[PairRecord] {
        &self.pairs
    }

    pub fn skipped(&self) -> &[PairFailure] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Correlation of `{x, y}` in either order, if that pair was computed.
    pub fn get(&self, x: &str, y: &str) -> Option<f64> {
        self.pairs
            .iter()
            .find(|p| p.involves(x, y))
            .map(|p| p.correlation)
    }

    pub fn into_pairs(self) -> Vec<PairRecord> {
        self.pairs
    }
}

/// Correlate every unordered pair of `universe`, in universe order.
pub fn build_matrix(universe: &[AssetId], series: &SeriesSet) -> CorrelationMatrix {
    let n = universe.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    let mut skipped = Vec::new();

    for (i, a) in universe.iter().enumerate() {
        let series_a = series.get_or_empty(a.as_str());
        for b in &universe[i + 1..] {
            let series_b = series.get_or_empty(b.as_str());
            match try_correlation(series_a, series_b) {
                Ok(correlation) => pairs.push(PairRecord {
                    a: a.clone(),
                    b: b.clone(),
                    correlation,
                }),
                Err(reason) => {
                    tracing::warn!(%a, %b, %reason, "skipping pair");
                    skipped.push(PairFailure {
                        a: a.clone(),
                        b: b.clone(),
                        reason,
                    });
                }
            }
        }
    }

    tracing::debug!(
        assets = n,
        pairs = pairs.len(),
        skipped = skipped.len(),
        "correlation matrix built"
    );

    CorrelationMatrix { pairs, skipped }
}
