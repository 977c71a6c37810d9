//! Plot configuration records and their vocabulary.

mod registry;
mod update;

pub use registry::PlotRegistry;
pub use update::{FieldContext, ForcedField, PlotField, PlotUpdate, UpdateReport};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use roichart_core::{AxisBounds, CentileKind, Dataset, Error, Result};
use serde::{Deserialize, Serialize};

use crate::config::DashboardConfig;

/// Identifier of a plot, unique within a session.
///
/// Displays as `Plot<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotId(u32);

impl PlotId {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plot{}", self.0)
    }
}

impl FromStr for PlotId {
    type Err = Error;

    /// Accepts `Plot3` as well as a bare `3`.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("Plot").unwrap_or(s);
        digits
            .parse::<u32>()
            .map(PlotId)
            .map_err(|_| Error::UnknownPlot(s.to_string()))
    }
}

/// Chart type of a plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    #[default]
    Scatter,
    Distribution,
}

impl PlotKind {
    pub const ALL: [PlotKind; 2] = [PlotKind::Scatter, PlotKind::Distribution];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PlotKind::Scatter => "scatter",
            PlotKind::Distribution => "distribution",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PlotKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation("kind", format!("unknown plot kind {s}")))
    }
}

/// Trend line drawn through scatter data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    None,
    #[default]
    Linear,
    /// Locally weighted regression (LOWESS).
    Smoothed,
}

impl TrendKind {
    pub const ALL: [TrendKind; 3] = [TrendKind::None, TrendKind::Linear, TrendKind::Smoothed];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TrendKind::None => "none",
            TrendKind::Linear => "linear",
            TrendKind::Smoothed => "smoothed",
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TrendKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation("trend", format!("unknown trend {s}")))
    }
}

/// Overlay layer tag.
///
/// The declaration order is the draw order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TraceKind {
    #[serde(rename = "data")]
    Data,
    #[serde(rename = "lin_fit")]
    LinFit,
    #[serde(rename = "conf_95%")]
    Conf95,
    #[serde(rename = "centile_5")]
    Centile5,
    #[serde(rename = "centile_25")]
    Centile25,
    #[serde(rename = "centile_50")]
    Centile50,
    #[serde(rename = "centile_75")]
    Centile75,
    #[serde(rename = "centile_95")]
    Centile95,
    #[serde(rename = "density")]
    Density,
    #[serde(rename = "rug")]
    Rug,
    #[serde(rename = "selection")]
    Selection,
}

impl TraceKind {
    pub const ALL: [TraceKind; 11] = [
        TraceKind::Data,
        TraceKind::LinFit,
        TraceKind::Conf95,
        TraceKind::Centile5,
        TraceKind::Centile25,
        TraceKind::Centile50,
        TraceKind::Centile75,
        TraceKind::Centile95,
        TraceKind::Density,
        TraceKind::Rug,
        TraceKind::Selection,
    ];

    /// Tags drawn for a linear trend.
    pub const LINEAR_FIT: [TraceKind; 2] = [TraceKind::LinFit, TraceKind::Conf95];

    /// Tags drawn for a centile overlay.
    pub const CENTILES: [TraceKind; 5] = [
        TraceKind::Centile5,
        TraceKind::Centile25,
        TraceKind::Centile50,
        TraceKind::Centile75,
        TraceKind::Centile95,
    ];

    /// Fixed layer set of distribution plots.
    pub const DISTRIBUTION: [TraceKind; 2] = [TraceKind::Density, TraceKind::Rug];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            TraceKind::Data => "data",
            TraceKind::LinFit => "lin_fit",
            TraceKind::Conf95 => "conf_95%",
            TraceKind::Centile5 => "centile_5",
            TraceKind::Centile25 => "centile_25",
            TraceKind::Centile50 => "centile_50",
            TraceKind::Centile75 => "centile_75",
            TraceKind::Centile95 => "centile_95",
            TraceKind::Density => "density",
            TraceKind::Rug => "rug",
            TraceKind::Selection => "selection",
        }
    }

    /// Reference level of a centile tag.
    #[must_use]
    pub fn centile_level(self) -> Option<f64> {
        match self {
            TraceKind::Centile5 => Some(5.0),
            TraceKind::Centile25 => Some(25.0),
            TraceKind::Centile50 => Some(50.0),
            TraceKind::Centile75 => Some(75.0),
            TraceKind::Centile95 => Some(95.0),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_centile(self) -> bool {
        self.centile_level().is_some()
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TraceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TraceKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| Error::validation("traces", format!("unknown trace {s}")))
    }
}

/// Axis of a two-dimensional plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Configuration of one plot.
///
/// Records are owned by [`PlotRegistry`]; other components read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    pub id: PlotId,
    pub kind: PlotKind,
    pub x_var: Option<String>,
    pub x_bounds: Option<AxisBounds>,
    pub y_var: Option<String>,
    pub y_bounds: Option<AxisBounds>,
    /// Grouping variable; `None` means ungrouped.
    pub group_by: Option<String>,
    /// Shown group values; empty means every group.
    pub group_values: Vec<String>,
    pub correct_icv: bool,
    /// Plot the measurement as its centile score.
    pub centile_normalized: bool,
    pub trend: TrendKind,
    /// Smoothing span of the smoothed trend.
    pub smoothing: f64,
    pub traces: BTreeSet<TraceKind>,
    pub centile_overlay: CentileKind,
}

impl PlotConfig {
    /// Variable plotted as the subject measurement.
    ///
    /// Scatter plots measure along y, distribution plots along x.
    #[must_use]
    pub fn measurement_var(&self) -> Option<&str> {
        match self.kind {
            PlotKind::Scatter => self.y_var.as_deref(),
            PlotKind::Distribution => self.x_var.as_deref(),
        }
    }

    #[must_use]
    pub fn measurement_axis(&self) -> Axis {
        match self.kind {
            PlotKind::Scatter => Axis::Y,
            PlotKind::Distribution => Axis::X,
        }
    }

    #[must_use]
    pub fn var(&self, axis: Axis) -> Option<&str> {
        match axis {
            Axis::X => self.x_var.as_deref(),
            Axis::Y => self.y_var.as_deref(),
        }
    }

    #[must_use]
    pub fn bounds(&self, axis: Axis) -> Option<AxisBounds> {
        match axis {
            Axis::X => self.x_bounds,
            Axis::Y => self.y_bounds,
        }
    }

    /// Returns true if the x axis is the age variable.
    #[must_use]
    pub fn is_age_axis(&self, config: &DashboardConfig) -> bool {
        self.x_var.as_deref() == Some(config.age_variable.as_str())
    }

    /// Values drawn on `axis` after ICV correction or centile normalization.
    ///
    /// Returns `None` when the axis has no variable or the needed columns
    /// are missing.
    #[must_use]
    pub fn axis_values(
        &self,
        axis: Axis,
        dataset: &Dataset,
        config: &DashboardConfig,
    ) -> Option<Vec<f64>> {
        let var = self.var(axis)?;
        if axis != self.measurement_axis() {
            return dataset.numeric(var).map(<[f64]>::to_vec);
        }
        if self.centile_normalized {
            dataset
                .numeric(&roichart_core::centile_column_name(var))
                .map(<[f64]>::to_vec)
        } else if self.correct_icv {
            dataset.icv_corrected(var, &config.icv_variable, config.mean_icv)
        } else {
            dataset.numeric(var).map(<[f64]>::to_vec)
        }
    }

    /// Axis title reflecting the applied transformation.
    #[must_use]
    pub fn axis_label(&self, axis: Axis) -> Option<String> {
        let var = self.var(axis)?;
        if axis != self.measurement_axis() {
            return Some(var.to_string());
        }
        Some(if self.centile_normalized {
            format!("{var} (centile)")
        } else if self.correct_icv {
            format!("{var} (ICV corrected)")
        } else {
            var.to_string()
        })
    }

    /// Recomputes the default bounds of `axis`.
    pub(crate) fn refresh_bounds(
        &mut self,
        axis: Axis,
        dataset: &Dataset,
        config: &DashboardConfig,
    ) {
        let bounds = self
            .axis_values(axis, dataset, config)
            .and_then(|values| roichart_core::padded_bounds(&values));
        match axis {
            Axis::X => self.x_bounds = bounds,
            Axis::Y => self.y_bounds = bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_id_display_and_parse() {
        let id = PlotId::new(3);
        assert_eq!(id.to_string(), "Plot3");
        assert_eq!("Plot3".parse::<PlotId>().unwrap(), id);
        assert_eq!("3".parse::<PlotId>().unwrap(), id);
        assert!("PlotX".parse::<PlotId>().is_err());
    }

    #[test]
    fn test_trace_tags_round_trip() {
        for trace in TraceKind::ALL {
            assert_eq!(trace.tag().parse::<TraceKind>().unwrap(), trace);
        }
        assert_eq!(TraceKind::Conf95.tag(), "conf_95%");
        assert!("lowess".parse::<TraceKind>().is_err());
    }

    #[test]
    fn test_trace_order_is_draw_order() {
        let set: BTreeSet<TraceKind> = [TraceKind::Rug, TraceKind::Data, TraceKind::Centile50]
            .into_iter()
            .collect();
        let order: Vec<_> = set.into_iter().collect();
        assert_eq!(
            order,
            vec![TraceKind::Data, TraceKind::Centile50, TraceKind::Rug]
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("Distribution".parse::<PlotKind>().unwrap(), PlotKind::Distribution);
        assert_eq!("smoothed".parse::<TrendKind>().unwrap(), TrendKind::Smoothed);
        assert!("bar".parse::<PlotKind>().is_err());
    }
}
