//! Pearson product-moment correlation between two aligned price series.
//!
//! Degenerate input never fails: an empty or mismatched pair, or a series with
//! zero variance, has a correlation of exactly 0. The only failures are
//! non-finite samples or a non-finite result, which [`try_correlation`]
//! reports and [`correlation`] maps to 0.

use super::normalize::are_comparable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CorrelationError {
    #[error("non-finite sample at position {index}")]
    NonFiniteSample { index: usize },

    #[error("correlation overflowed to a non-finite value")]
    NonFiniteResult,
}

/// Arithmetic mean, summed left to right. The mean of an empty slice is 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Pearson correlation of `a` and `b`, or the reason it could not be computed.
pub fn try_correlation(a: &[f64], b: &[f64]) -> Result<f64, CorrelationError> {
    if !are_comparable(Some(a), Some(b)) {
        return Ok(0.0);
    }

    if let Some(index) = a
        .iter()
        .zip(b)
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(CorrelationError::NonFiniteSample { index });
    }

    // Zero variance: a constant series is uncorrelated with anything. Checked
    // on the samples, since a mean that does not sum exactly leaves tiny
    // nonzero deviations.
    if is_constant(a) || is_constant(b) {
        return Ok(0.0);
    }

    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut numerator = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        numerator += dx * dy;
        denom_a += dx * dx;
        denom_b += dy * dy;
    }

    if denom_a == 0.0 || denom_b == 0.0 {
        return Ok(0.0);
    }

    let r = numerator / (denom_a * denom_b).sqrt();
    if !r.is_finite() {
        return Err(CorrelationError::NonFiniteResult);
    }
    Ok(r)
}

/// Pearson correlation of `a` and `b`; always finite, 0 for any input that
/// cannot be correlated.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    try_correlation(a, b).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_series_correlate_exactly_one() {
        let s = [1.0, 2.5, 2.0, 4.0, 3.5];
        assert_eq!(correlation(&s, &s), 1.0);
    }

    #[test]
    fn mirrored_series_correlate_minus_one() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [4.0, 3.0, 2.0, 1.0];
        assert!((correlation(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn known_value() {
        // deviations [-1, 0, 1] and [-1, 1, 0]: numerator 1, denominators 2 and 2
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 3.0, 2.0];
        let expected = 1.0 / (2.0_f64 * 2.0).sqrt();
        assert!((correlation(&a, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_zero() {
        let flat = [5.0, 5.0, 5.0];
        let moving = [1.0, 2.0, 3.0];
        assert_eq!(correlation(&flat, &moving), 0.0);
        assert_eq!(correlation(&moving, &flat), 0.0);
        assert_eq!(correlation(&flat, &flat), 0.0);
    }

    #[test]
    fn flat_series_with_inexact_mean_is_zero() {
        // 0.999 * 720 / 720 != 0.999 in floating point
        let peg_low = [0.999; 720];
        let peg_high = [1.001; 720];
        assert_eq!(correlation(&peg_low, &peg_low), 0.0);
        assert_eq!(correlation(&peg_low, &peg_high), 0.0);

        let moving: Vec<f64> = (0..720).map(f64::from).collect();
        assert_eq!(correlation(&peg_low, &moving), 0.0);
        assert_eq!(correlation(&moving, &peg_high), 0.0);
    }

    #[test]
    fn empty_and_mismatched_are_zero() {
        assert_eq!(correlation(&[], &[]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0], &[]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn single_sample_is_zero() {
        assert_eq!(correlation(&[3.0], &[7.0]), 0.0);
    }

    #[test]
    fn non_finite_sample_is_reported() {
        let a = [1.0, f64::NAN, 3.0];
        let b = [1.0, 2.0, 3.0];
        assert_eq!(
            try_correlation(&a, &b),
            Err(CorrelationError::NonFiniteSample { index: 1 })
        );
        assert_eq!(
            try_correlation(&b, &[1.0, 2.0, f64::INFINITY]),
            Err(CorrelationError::NonFiniteSample { index: 2 })
        );
        assert_eq!(correlation(&a, &b), 0.0);
    }

    #[test]
    fn mismatch_wins_over_non_finite() {
        assert_eq!(try_correlation(&[f64::NAN], &[1.0, 2.0]), Ok(0.0));
    }

    #[test]
    fn overflow_is_reported() {
        let a = [-1e300, 1e300];
        let b = [-1e300, 1e300];
        assert_eq!(try_correlation(&a, &b), Err(CorrelationError::NonFiniteResult));
        assert_eq!(correlation(&a, &b), 0.0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }
}
