//! Selection strategies over the correlation structure of a universe.
//!
//! Two independent policies:
//! - [`top_k`]: the `k` pairs with the strongest absolute correlation
//! - [`select_uncorrelated`]: a greedily grown set of mutually low-correlation assets
//!
//! Neither carries default targets; counts and thresholds are supplied by the caller.

pub mod greedy;
pub mod top_k;

pub use greedy::{select_uncorrelated, select_uncorrelated_by};
pub use top_k::top_k;

use crate::correlation::{build_matrix, CorrelationMatrix, PairRecord};
use crate::domain::{AssetId, SeriesSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which selection policy to run, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Rank all pairs by `|correlation|` and keep the strongest `k`.
    TopK { k: usize },
    /// Single-pass greedy set whose pairwise `|correlation|` stays below `threshold`.
    Greedy { target_size: i64, threshold: f64 },
}

impl SelectionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TopK { .. } => "top_k",
            Self::Greedy { .. } => "greedy",
        }
    }

    /// Run the strategy over `universe`.
    ///
    /// Top-K builds the full correlation matrix and returns it alongside the
    /// ranking; greedy correlates only the pairs it needs and returns no matrix.
    pub fn apply(&self, universe: &[AssetId], series: &SeriesSet) -> SelectionOutcome {
        match *self {
            Self::TopK { k } => {
                let matrix = build_matrix(universe, series);
                let ranked = top_k(matrix.pairs(), k);
                SelectionOutcome {
                    result: SelectionResult::Ranked(ranked),
                    matrix: Some(matrix),
                }
            }
            Self::Greedy {
                target_size,
                threshold,
            } => SelectionOutcome {
                result: SelectionResult::Uncorrelated(select_uncorrelated(
                    universe,
                    series,
                    target_size,
                    threshold,
                )),
                matrix: None,
            },
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopK { k } => write!(f, "top_k(k={k})"),
            Self::Greedy {
                target_size,
                threshold,
            } => write!(f, "greedy(target_size={target_size}, threshold={threshold})"),
        }
    }
}

/// Output of a selection strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum SelectionResult {
    /// Assets chosen by the greedy selector, in acceptance order.
    Uncorrelated(Vec<AssetId>),
    /// Pairs ranked by descending `|correlation|`.
    Ranked(Vec<PairRecord>),
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Uncorrelated(assets) => assets.len(),
            Self::Ranked(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A strategy's result plus the matrix it computed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub result: SelectionResult,
    pub matrix: Option<CorrelationMatrix>,
}
