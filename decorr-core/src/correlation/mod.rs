//! Correlation engine and matrix builder

pub mod engine;
pub mod matrix;
pub mod normalize;

pub use engine::{correlation, mean, try_correlation, CorrelationError};
pub use matrix::{build_matrix, CorrelationMatrix, PairFailure, PairRecord};
pub use normalize::are_comparable;
