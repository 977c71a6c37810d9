//! Reference centile tables.
//!
//! A table holds, for every (ROI, reference age) pair, the ROI value observed
//! at each centile level of a reference population.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Column-name prefix of centile levels (`centile_50`).
pub const LEVEL_PREFIX: &str = "centile_";

/// Column name for a centile level.
#[must_use]
pub fn level_column_name(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{LEVEL_PREFIX}{level:.0}")
    } else {
        format!("{LEVEL_PREFIX}{level}")
    }
}

/// Parses a `centile_<n>` column name into its level.
#[must_use]
pub fn parse_level_column(name: &str) -> Option<f64> {
    name.strip_prefix(LEVEL_PREFIX)?
        .parse::<f64>()
        .ok()
        .filter(|level| level.is_finite())
}

/// Reference population used for centile overlays and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CentileKind {
    /// No reference population.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "none"))]
    None,
    /// Cognitively normal subjects.
    #[cfg_attr(feature = "serde", serde(rename = "CN"))]
    Cn,
    /// Cognitively normal males.
    #[cfg_attr(feature = "serde", serde(rename = "CN_Males"))]
    CnMales,
    /// Cognitively normal females.
    #[cfg_attr(feature = "serde", serde(rename = "CN_Females"))]
    CnFemales,
    /// Cognitively normal subjects, ICV-corrected volumes.
    #[cfg_attr(feature = "serde", serde(rename = "CN_ICV_Corrected"))]
    CnIcvCorrected,
}

impl CentileKind {
    /// Every kind, `None` first.
    pub const ALL: [CentileKind; 5] = [
        CentileKind::None,
        CentileKind::Cn,
        CentileKind::CnMales,
        CentileKind::CnFemales,
        CentileKind::CnIcvCorrected,
    ];

    /// File tag of the kind (empty for `None`).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            CentileKind::None => "",
            CentileKind::Cn => "CN",
            CentileKind::CnMales => "CN_Males",
            CentileKind::CnFemales => "CN_Females",
            CentileKind::CnIcvCorrected => "CN_ICV_Corrected",
        }
    }

    /// Returns true for the `None` kind.
    #[must_use]
    pub fn is_none(self) -> bool {
        self == CentileKind::None
    }

    /// Reference file name for this kind, if any.
    #[must_use]
    pub fn file_name(self) -> Option<String> {
        (!self.is_none()).then(|| format!("istag_centiles_{}.csv", self.tag()))
    }
}

impl fmt::Display for CentileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CentileKind::None => write!(f, "none"),
            other => write!(f, "{}", other.tag()),
        }
    }
}

impl FromStr for CentileKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(CentileKind::None);
        }
        CentileKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| Error::validation("centile type", format!("unknown centile type {s}")))
    }
}

/// Reference values of one ROI at one reference age.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CentileRow {
    /// ROI name.
    pub roi: String,
    /// Reference age.
    pub age: f64,
    /// Values per level, non-decreasing.
    pub values: Vec<f64>,
}

/// Reference centile table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceCentileTable {
    levels: Vec<f64>,
    rows: Vec<CentileRow>,
}

impl ReferenceCentileTable {
    /// Creates an empty table with the given centile levels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCentileTable`] unless there are at least two
    /// finite, strictly increasing levels.
    pub fn new(levels: Vec<f64>) -> Result<Self> {
        if levels.len() < 2 {
            return Err(Error::InvalidCentileTable(
                "at least two centile levels are required".to_string(),
            ));
        }
        if levels.iter().any(|l| !l.is_finite()) || levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidCentileTable(format!(
                "centile levels must be finite and strictly increasing: {levels:?}"
            )));
        }
        Ok(Self {
            levels,
            rows: Vec::new(),
        })
    }

    /// Builder form of [`ReferenceCentileTable::push_row`].
    ///
    /// # Errors
    ///
    /// See [`ReferenceCentileTable::push_row`].
    pub fn with_row(mut self, roi: impl Into<String>, age: f64, values: Vec<f64>) -> Result<Self> {
        self.push_row(roi, age, values)?;
        Ok(self)
    }

    /// Appends a reference row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCentileTable`] if the row width differs from
    /// the level count, a value is not finite, or values decrease.
    pub fn push_row(&mut self, roi: impl Into<String>, age: f64, values: Vec<f64>) -> Result<()> {
        let roi = roi.into();
        if values.len() != self.levels.len() {
            return Err(Error::InvalidCentileTable(format!(
                "row {roi}@{age} has {} values, expected {}",
                values.len(),
                self.levels.len()
            )));
        }
        if !age.is_finite() || values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidCentileTable(format!(
                "row {roi}@{age} contains non-finite values"
            )));
        }
        if values.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidCentileTable(format!(
                "row {roi}@{age} is not monotonic across centile levels"
            )));
        }
        self.rows.push(CentileRow { roi, age, values });
        Ok(())
    }

    /// Centile levels in ascending order.
    #[must_use]
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Index of a level.
    #[must_use]
    pub fn level_index(&self, level: f64) -> Option<usize> {
        self.levels.iter().position(|l| (l - level).abs() < f64::EPSILON)
    }

    /// All reference rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[CentileRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct ROI names.
    #[must_use]
    pub fn rois(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.roi.as_str()).collect()
    }

    /// Reference age closest to `age`; the first row wins on equal distance.
    #[must_use]
    pub fn nearest_age(&self, age: f64) -> Option<f64> {
        if !age.is_finite() {
            return None;
        }
        let mut best: Option<(f64, f64)> = None;
        for row in &self.rows {
            let diff = (row.age - age).abs();
            if best.map_or(true, |(best_diff, _)| diff < best_diff) {
                best = Some((diff, row.age));
            }
        }
        best.map(|(_, ref_age)| ref_age)
    }

    /// Rows at exactly the given reference age, keyed by ROI.
    ///
    /// If an ROI repeats at the same age, the first row is kept.
    #[must_use]
    pub fn rows_at_age(&self, age: f64) -> BTreeMap<&str, &CentileRow> {
        let mut out = BTreeMap::new();
        for row in self.rows.iter().filter(|row| row.age == age) {
            out.entry(row.roi.as_str()).or_insert(row);
        }
        out
    }

    /// `(age, value)` points of one ROI at one level, sorted by age.
    #[must_use]
    pub fn curve(&self, roi: &str, level_index: usize) -> Vec<[f64; 2]> {
        let mut points: Vec<[f64; 2]> = self
            .rows
            .iter()
            .filter(|row| row.roi == roi)
            .filter_map(|row| row.values.get(level_index).map(|v| [row.age, *v]))
            .collect();
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
        points
    }
}
