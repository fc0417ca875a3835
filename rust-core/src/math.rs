//! Scalar math helpers shared by the window factory and kernel builder

use std::f64::consts::{LN_10, LN_2};

/// Logarithm with base 2, computed as `ln(x) / ln(2)`
pub fn log2(x: f64) -> f64 {
    x.ln() / LN_2
}

/// Smallest power of two that is greater than or equal to `x`
///
/// Values of zero and one both map to 1. Values above the largest
/// representable power of two saturate to it.
pub fn next_power_of_two(x: usize) -> usize {
    x.checked_next_power_of_two().unwrap_or(1 << (usize::BITS - 1))
}

/// Decibel-to-linear conversion, such that `db_to_linear(-6.0)` is about 0.5
pub fn db_to_linear(db: f64) -> f64 {
    (db / 20.0 * LN_10).exp()
}

/// Linear-to-decibel conversion, such that `linear_to_db(2.0)` is about +6
pub fn linear_to_db(linear: f64) -> f64 {
    linear.log10() * 20.0
}
