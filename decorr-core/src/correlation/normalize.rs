//! Comparability check for a pair of price series.

/// Whether two series can be correlated position-wise.
///
/// Comparable iff both are present, non-empty and of equal length. An absent
/// series (`None`) is treated as empty.
pub fn are_comparable(a: Option<&[f64]>, b: Option<&[f64]>) -> bool {
    let a = a.unwrap_or(&[]);
    let b = b.unwrap_or(&[]);
    !a.is_empty() && a.len() == b.len()
}
