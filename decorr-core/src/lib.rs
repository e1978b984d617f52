//! Decorr Core: correlation engine, selection strategies, market data sources.
//!
//! This crate contains the analytical core:
//! - Domain types (asset ids, universes, price series, time windows)
//! - Pearson correlation with a never-fail degenerate-input policy
//! - Pairwise correlation matrix over an ordered universe
//! - Top-K pair ranking and greedy uncorrelated-set selection
//! - Data source contracts plus CoinGecko and synthetic providers
//!
//! The core is synchronous and holds no global state: every operation takes
//! the universe and series it works on as explicit arguments.

pub mod correlation;
pub mod data;
pub mod domain;
pub mod selection;

pub use correlation::{build_matrix, correlation, CorrelationMatrix, PairRecord};
pub use domain::{AssetId, PriceSeries, SeriesSet, TimeWindow, Universe};
pub use selection::{
    select_uncorrelated, top_k, SelectionOutcome, SelectionResult, SelectionStrategy,
};
