//! Common test macros.

/// Assert two `f64`s are equal, treating NaN as equal to NaN.
///
/// # Usage
/// ```
/// assert_value_eq!(actual, expected);
/// ```
#[macro_export]
macro_rules! assert_value_eq {
    ($actual:expr, $expected:expr) => {
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        assert!(
            (actual.is_nan() && expected.is_nan()) || actual == expected,
            "assertion failed: `(left == right)` (NaN-aware)\n  left: `{:?}`,\n right: `{:?}`",
            actual,
            expected
        );
    };
}
