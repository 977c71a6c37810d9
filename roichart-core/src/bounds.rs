//! Default axis ranges with view padding.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Dataset;

/// Padding divisor applied to the data range.
pub const RANGE_PAD_DIVISOR: f64 = 5.0;

/// Padding divisor applied to the value of a constant column.
pub const CONSTANT_PAD_DIVISOR: f64 = 8.0;

/// Axis range of a plot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    /// Creates bounds from explicit limits.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Returns true if `value` lies within the range (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true for a zero-width range.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }
}

/// Raw min/max of the finite values.
#[must_use]
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Padded bounds for a set of values.
///
/// A non-constant range is widened by a fifth of its width on each side.
/// A constant value `c` is widened by `|c| / 8`, which leaves `c == 0`
/// as a zero-width range.
#[must_use]
pub fn padded_bounds(values: &[f64]) -> Option<AxisBounds> {
    let (lo, hi) = value_range(values)?;
    let range = hi - lo;
    let pad = if range == 0.0 {
        lo.abs() / CONSTANT_PAD_DIVISOR
    } else {
        range / RANGE_PAD_DIVISOR
    };
    Some(AxisBounds::new(lo - pad, hi + pad))
}

/// Default bounds of a dataset column.
///
/// Returns `None` when the column is absent, categorical, or has no finite
/// values; the axis then stays unset.
#[must_use]
pub fn compute_axis_bounds(dataset: &Dataset, variable: &str) -> Option<AxisBounds> {
    padded_bounds(dataset.numeric(variable)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;
    use approx::assert_relative_eq;

    #[test]
    fn test_range_padding() {
        let b = padded_bounds(&[10.0, 20.0, 15.0]).unwrap();
        assert_relative_eq!(b.min, 8.0);
        assert_relative_eq!(b.max, 22.0);
    }

    #[test]
    fn test_constant_column_padding() {
        let b = padded_bounds(&[10.0, 10.0, 10.0]).unwrap();
        assert_relative_eq!(b.min, 10.0 - 10.0 / 8.0);
        assert_relative_eq!(b.max, 10.0 + 10.0 / 8.0);
    }

    #[test]
    fn test_zero_constant_is_degenerate() {
        let b = padded_bounds(&[0.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(b.min, 0.0);
        assert_relative_eq!(b.max, 0.0);
        assert!(b.is_degenerate());
    }

    #[test]
    fn test_negative_constant_keeps_order() {
        let b = padded_bounds(&[-8.0, -8.0]).unwrap();
        assert!(b.min < b.max);
    }

    #[test]
    fn test_nan_ignored() {
        let b = padded_bounds(&[f64::NAN, 0.0, 5.0]).unwrap();
        assert_relative_eq!(b.min, -1.0);
        assert_relative_eq!(b.max, 6.0);
        assert!(padded_bounds(&[f64::NAN]).is_none());
        assert!(padded_bounds(&[]).is_none());
    }

    #[test]
    fn test_missing_or_categorical_column() {
        let ds = Dataset::new("MRID", vec!["S1".into()])
            .unwrap()
            .with_column("Sex", Column::Categorical(vec!["F".into()]))
            .unwrap();
        assert!(compute_axis_bounds(&ds, "Sex").is_none());
        assert!(compute_axis_bounds(&ds, "Age").is_none());
    }
}
