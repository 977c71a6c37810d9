//! Subject centile estimation against a reference table.
//!
//! Centiles are interpolated piecewise-linearly between the two reference
//! levels bracketing the subject value. Values outside the tabulated range
//! are extrapolated along the nearest bracket rather than clamped.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::centiles::ReferenceCentileTable;
use crate::dataset::{centile_column_name, Column, Dataset};
use crate::{AmbiguousCentile, Error, Result};

/// Age and ROI values of a single subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectMeasurements {
    /// Subject age.
    pub age: f64,
    /// ROI name to measured value.
    pub values: BTreeMap<String, f64>,
}

impl SubjectMeasurements {
    /// Creates measurements for a subject of the given age.
    #[must_use]
    pub fn new(age: f64) -> Self {
        Self {
            age,
            values: BTreeMap::new(),
        }
    }

    /// Adds one ROI value.
    #[must_use]
    pub fn with_value(mut self, roi: impl Into<String>, value: f64) -> Self {
        self.values.insert(roi.into(), value);
        self
    }
}

/// Result of [`estimate_subject_centiles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectCentiles {
    /// Reference age used for the lookup.
    pub reference_age: Option<f64>,
    /// ROI name to estimated centile.
    pub centiles: BTreeMap<String, f64>,
    /// ROIs skipped because of a degenerate reference bracket.
    pub ambiguous: Vec<AmbiguousCentile>,
}

impl SubjectCentiles {
    /// Centile of one ROI.
    #[must_use]
    pub fn get(&self, roi: &str) -> Option<f64> {
        self.centiles.get(roi).copied()
    }
}

/// Interpolates the centile of `value` given one reference row.
///
/// `levels` and `values` must have equal length of at least two, with
/// `values` non-decreasing.
///
/// # Errors
///
/// Returns [`AmbiguousCentile`] when the selected bracket has equal values.
pub fn interpolate_centile(
    roi: &str,
    levels: &[f64],
    values: &[f64],
    value: f64,
) -> std::result::Result<f64, AmbiguousCentile> {
    debug_assert!(levels.len() >= 2 && levels.len() == values.len());

    let last = values.len() - 1;
    // smallest i with value < c_i; below-range reuses the lowest bracket,
    // above-range the highest one
    let upper = match values.iter().position(|&c| value < c) {
        Some(0) => 1,
        Some(i) => i,
        None => last,
    };
    let lower = upper - 1;

    let (c_lo, c_hi) = (values[lower], values[upper]);
    let (l_lo, l_hi) = (levels[lower], levels[upper]);
    if c_hi == c_lo {
        return Err(AmbiguousCentile {
            roi: roi.to_string(),
            lower_level: l_lo,
            upper_level: l_hi,
            value: c_lo,
        });
    }
    Ok(l_lo + (l_hi - l_lo) * (value - c_lo) / (c_hi - c_lo))
}

/// Estimates a subject's centile for every ROI present in both the subject
/// and the reference rows at the nearest reference age.
///
/// Non-finite subject values are skipped. Degenerate brackets are reported
/// in [`SubjectCentiles::ambiguous`] and do not stop the other ROIs.
#[must_use]
pub fn estimate_subject_centiles(
    table: &ReferenceCentileTable,
    subject: &SubjectMeasurements,
) -> SubjectCentiles {
    let Some(reference_age) = table.nearest_age(subject.age) else {
        return SubjectCentiles::default();
    };
    let rows = table.rows_at_age(reference_age);

    let mut out = SubjectCentiles {
        reference_age: Some(reference_age),
        ..SubjectCentiles::default()
    };
    for (roi, &value) in &subject.values {
        if !value.is_finite() {
            continue;
        }
        let Some(row) = rows.get(roi.as_str()) else {
            continue;
        };
        match interpolate_centile(roi, table.levels(), &row.values, value) {
            Ok(centile) => {
                out.centiles.insert(roi.clone(), centile);
            }
            Err(ambiguous) => out.ambiguous.push(ambiguous),
        }
    }
    out
}

/// Dataset extended with `<ROI>_centiles` columns.
#[derive(Debug, Clone)]
pub struct CentileAugmentation {
    /// Input dataset plus the derived columns.
    pub dataset: Dataset,
    /// Names of the derived columns, in ROI order.
    pub added_columns: Vec<String>,
    /// Skipped cells as (subject id, cause).
    pub ambiguous: Vec<(String, AmbiguousCentile)>,
}

/// Scores every subject against the table and appends centile columns.
///
/// Only ROIs that are numeric columns of the dataset and present in the
/// table are scored. Cells that cannot be scored are NaN. Existing
/// centile columns of the same name are replaced.
///
/// # Errors
///
/// Returns [`Error::MissingColumn`] if the age column is absent or not
/// numeric.
pub fn augment_with_centiles(
    dataset: &Dataset,
    table: &ReferenceCentileTable,
    age_column: &str,
) -> Result<CentileAugmentation> {
    let ages = dataset
        .numeric(age_column)
        .ok_or_else(|| Error::MissingColumn(age_column.to_string()))?;
    let table_rois = table.rois();
    let rois: Vec<&str> = dataset
        .numeric_columns()
        .into_iter()
        .filter(|name| *name != age_column && table_rois.contains(name))
        .collect();

    let scored: Vec<SubjectCentiles> = (0..dataset.len())
        .into_par_iter()
        .map(|row| {
            let subject = SubjectMeasurements {
                age: ages[row],
                values: dataset.row_values(row, rois.iter().copied()),
            };
            estimate_subject_centiles(table, &subject)
        })
        .collect();

    let mut augmented = dataset.clone();
    let mut added_columns = Vec::with_capacity(rois.len());
    for roi in &rois {
        let values: Vec<f64> = scored
            .iter()
            .map(|s| s.get(roi).unwrap_or(f64::NAN))
            .collect();
        let name = centile_column_name(roi);
        augmented.set_column(name.clone(), Column::Numeric(values))?;
        added_columns.push(name);
    }

    let ambiguous = scored
        .into_iter()
        .zip(dataset.ids())
        .flat_map(|(s, id)| s.ambiguous.into_iter().map(move |a| (id.clone(), a)))
        .collect();

    Ok(CentileAugmentation {
        dataset: augmented,
        added_columns,
        ambiguous,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LEVELS: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];
    const VALUES: [f64; 5] = [400.0, 450.0, 500.0, 550.0, 600.0];

    #[test]
    fn test_exact_reference_value_returns_level() {
        for (level, value) in LEVELS.iter().zip(VALUES) {
            let c = interpolate_centile("GM", &LEVELS, &VALUES, value).unwrap();
            assert_relative_eq!(c, *level);
        }
    }

    #[test]
    fn test_between_levels_is_strictly_between() {
        let c = interpolate_centile("GM", &LEVELS, &VALUES, 475.0).unwrap();
        assert_relative_eq!(c, 37.5);
        assert!(c > 25.0 && c < 50.0);
    }

    #[test]
    fn test_below_range_extrapolates_lowest_bracket() {
        // slope of (5, 25) over (400, 450) is 0.4 per unit
        let c = interpolate_centile("GM", &LEVELS, &VALUES, 350.0).unwrap();
        assert_relative_eq!(c, -15.0);
    }

    #[test]
    fn test_above_range_extrapolates_highest_bracket() {
        let c = interpolate_centile("GM", &LEVELS, &VALUES, 650.0).unwrap();
        assert_relative_eq!(c, 115.0);
    }

    #[test]
    fn test_degenerate_bracket_is_ambiguous() {
        let flat = [400.0, 400.0, 500.0, 550.0, 600.0];
        let err = interpolate_centile("GM", &LEVELS, &flat, 390.0).unwrap_err();
        assert_eq!(err.roi, "GM");
        assert_relative_eq!(err.lower_level, 5.0);
        assert_relative_eq!(err.upper_level, 25.0);

        // a flat segment away from the value does not matter
        let c = interpolate_centile("GM", &LEVELS, &flat, 525.0).unwrap();
        assert_relative_eq!(c, 62.5);
    }

    #[test]
    fn test_estimate_skips_ambiguous_and_non_finite() {
        let table = ReferenceCentileTable::new(LEVELS.to_vec())
            .unwrap()
            .with_row("GM", 60.0, VALUES.to_vec())
            .unwrap()
            .with_row("WM", 60.0, vec![300.0, 300.0, 340.0, 360.0, 380.0])
            .unwrap()
            .with_row("CSF", 60.0, vec![10.0, 20.0, 30.0, 40.0, 50.0])
            .unwrap();
        let subject = SubjectMeasurements::new(61.0)
            .with_value("GM", 500.0)
            .with_value("WM", 250.0)
            .with_value("CSF", f64::NAN)
            .with_value("Ventricles", 12.0);

        let out = estimate_subject_centiles(&table, &subject);
        assert_eq!(out.reference_age, Some(60.0));
        assert_relative_eq!(out.get("GM").unwrap(), 50.0);
        assert!(out.get("WM").is_none());
        assert!(out.get("CSF").is_none());
        assert!(out.get("Ventricles").is_none());
        assert_eq!(out.ambiguous.len(), 1);
        assert_eq!(out.ambiguous[0].roi, "WM");
    }
}
