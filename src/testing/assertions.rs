//! Reading blocks back and comparing series values.
//!
//! NaN stands for "missing" throughout the crate, and `NaN != NaN`, so the
//! comparisons here treat two NaNs at the same position as equal.

use crate::block::Block;
use crate::error::Result;

/// Every step of `block` as a column (one value per series).
///
/// # Errors
///
/// Propagates the first step-iteration error.
pub fn read_columns(block: &dyn Block) -> Result<Vec<Vec<f64>>> {
    block.step_iter()?.map(|step| step.map(|s| s.values)).collect()
}

/// Every series of `block` as a row (one value per step).
///
/// # Errors
///
/// Propagates the first step-iteration error.
pub fn read_rows(block: &dyn Block) -> Result<Vec<Vec<f64>>> {
    let columns = read_columns(block)?;
    let series = block.series_meta().len();
    Ok((0..series).map(|s| columns.iter().map(|col| col[s]).collect()).collect())
}

/// `true` when both values are NaN or both are equal numbers.
pub fn same_value(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

/// Assert two value vectors are equal, position by position, with NaN
/// matching NaN.
///
/// # Panics
///
/// Panics if the vectors differ in length or in any position.
///
/// # Example
///
/// ```
/// use blocktake::testing::assert_values_eq;
///
/// assert_values_eq(&[1.0, f64::NAN], &[1.0, f64::NAN]);
/// ```
pub fn assert_values_eq(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            same_value(*a, *e),
            "Value mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Row-wise [`assert_values_eq`].
///
/// # Panics
///
/// Panics if the row counts differ or any row differs.
pub fn assert_rows_eq(actual: &[Vec<f64>], expected: &[Vec<f64>]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (a, e) in actual.iter().zip(expected) {
        assert_values_eq(a, e);
    }
}

/// Number of non-NaN values.
pub fn count_present(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}
