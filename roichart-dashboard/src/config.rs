//! Dashboard configuration and working defaults.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use roichart_core::CentileKind;
use serde::{Deserialize, Serialize};

use crate::plot::{PlotKind, TraceKind, TrendKind};

/// Session-wide constants of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Variable against which centile overlays are meaningful.
    pub age_variable: String,
    /// Intracranial-volume column used for ICV correction.
    pub icv_variable: String,
    /// Reference mean ICV that corrected volumes are rescaled to.
    pub mean_icv: f64,
    /// Smallest allowed plots-per-row.
    pub min_per_row: usize,
    /// Largest allowed plots-per-row.
    pub max_per_row: usize,
    /// Initial plots-per-row.
    pub per_row: usize,
    /// Smallest smoothing span.
    pub min_smoothing: f64,
    /// Largest smoothing span.
    pub max_smoothing: f64,
    /// Sample count for fitted curves and densities.
    pub curve_samples: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            age_variable: "Age".to_string(),
            icv_variable: "ICV".to_string(),
            mean_icv: 1_430_000.0, // average ICV of a large reference sample
            min_per_row: 1,
            max_per_row: 5,
            per_row: 2,
            min_smoothing: 0.4,
            max_smoothing: 1.0,
            curve_samples: 100,
        }
    }
}

impl DashboardConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the age variable.
    #[must_use]
    pub fn with_age_variable(mut self, name: impl Into<String>) -> Self {
        self.age_variable = name.into();
        self
    }

    /// Sets the ICV column and reference mean.
    #[must_use]
    pub fn with_icv(mut self, name: impl Into<String>, mean_icv: f64) -> Self {
        self.icv_variable = name.into();
        self.mean_icv = mean_icv;
        self
    }

    /// Sets the initial plots-per-row.
    #[must_use]
    pub fn with_per_row(mut self, per_row: usize) -> Self {
        self.per_row = per_row;
        self
    }

    /// Allowed plots-per-row.
    #[must_use]
    pub fn per_row_range(&self) -> RangeInclusive<usize> {
        self.min_per_row..=self.max_per_row
    }

    /// Allowed smoothing spans.
    #[must_use]
    pub fn smoothing_range(&self) -> RangeInclusive<f64> {
        self.min_smoothing..=self.max_smoothing
    }
}

/// Settings copied into every newly added plot.
///
/// The registry seeds new plots from these so that a fresh plot matches the
/// most recently used settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDefaults {
    pub kind: PlotKind,
    pub x_var: Option<String>,
    pub y_var: Option<String>,
    pub group_by: Option<String>,
    pub trend: TrendKind,
    pub smoothing: f64,
    pub traces: BTreeSet<TraceKind>,
    pub centile_overlay: CentileKind,
}

impl Default for PlotDefaults {
    fn default() -> Self {
        Self {
            kind: PlotKind::Scatter,
            x_var: Some("Age".to_string()),
            y_var: Some("GM".to_string()),
            group_by: None,
            trend: TrendKind::Linear,
            smoothing: 0.7,
            traces: [TraceKind::Data, TraceKind::LinFit].into_iter().collect(),
            centile_overlay: CentileKind::None,
        }
    }
}

impl PlotDefaults {
    /// Defaults whose x variable is the configured age variable.
    #[must_use]
    pub fn for_config(config: &DashboardConfig) -> Self {
        Self {
            x_var: Some(config.age_variable.clone()),
            ..Self::default()
        }
    }
}
