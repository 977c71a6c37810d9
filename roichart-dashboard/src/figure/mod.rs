//! Plain series data for drawing a plot.
//!
//! A [`Figure`] holds one [`Layer`] per drawn trace and legend group, ready
//! for any charting front end.

pub mod density;
pub mod fit;

use roichart_core::bounds::value_range;
use roichart_core::{AxisBounds, Dataset, ReferenceCentileTable};
use serde::Serialize;

use crate::command::Warning;
use crate::config::DashboardConfig;
use crate::plot::{Axis, PlotConfig, PlotId, PlotKind, TraceKind, TrendKind};
use crate::selection::Selection;
use crate::traces::active_traces;
use crate::util::{finite_pairs, linspace};
use crate::view::{PlotView, Series};

use density::gaussian_kde;
use fit::{lowess, LinearFit, LOWESS_ITERATIONS};

/// Name of the smoothed trend layer.
pub const LOWESS_LAYER: &str = "lowess";

/// Drawable shape of a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Subject points with their identifiers, in rendered order.
    Points { points: Vec<[f64; 2]>, ids: Vec<String> },
    Line { points: Vec<[f64; 2]> },
    Band { lower: Vec<[f64; 2]>, upper: Vec<[f64; 2]> },
    Rug { values: Vec<f64> },
    Marker { point: [f64; 2], subject: String },
}

/// One drawn trace of one legend group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    /// Trace tag; `None` for the smoothed trend.
    pub trace: Option<TraceKind>,
    pub group: Option<String>,
    pub geometry: Geometry,
}

/// Everything needed to draw one plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub plot: PlotId,
    pub kind: PlotKind,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_bounds: Option<AxisBounds>,
    pub y_bounds: Option<AxisBounds>,
    pub layers: Vec<Layer>,
    pub warnings: Vec<Warning>,
}

impl Figure {
    /// Layers carrying `trace`.
    pub fn layers_of(&self, trace: TraceKind) -> impl Iterator<Item = &Layer> {
        self.layers
            .iter()
            .filter(move |layer| layer.trace == Some(trace))
    }
}

/// Inputs of [`build_figure`].
#[derive(Debug, Clone, Copy)]
pub struct FigureInput<'a> {
    pub dataset: &'a Dataset,
    pub config: &'a DashboardConfig,
    pub plot: &'a PlotConfig,
    pub selection: &'a Selection,
    /// Reference table of the plot's centile overlay, if loaded.
    pub reference: Option<&'a ReferenceCentileTable>,
}

/// Builds the figure of one plot.
#[must_use]
pub fn build_figure(input: &FigureInput<'_>) -> Figure {
    let plot = input.plot;
    let mut figure = Figure {
        plot: plot.id,
        kind: plot.kind,
        x_label: plot.axis_label(Axis::X),
        y_label: match plot.kind {
            PlotKind::Scatter => plot.axis_label(Axis::Y),
            PlotKind::Distribution => Some("density".to_string()),
        },
        x_bounds: plot.x_bounds,
        y_bounds: match plot.kind {
            PlotKind::Scatter => plot.y_bounds,
            PlotKind::Distribution => None,
        },
        layers: Vec::new(),
        warnings: Vec::new(),
    };
    let traces = active_traces(plot, input.selection, input.config);
    let view = PlotView::derive(input.dataset, plot);

    match plot.kind {
        PlotKind::Scatter => scatter_layers(input, &view, &traces, &mut figure),
        PlotKind::Distribution => distribution_layers(input, &view, &traces, &mut figure),
    }
    figure
}

fn missing_axis(plot: &PlotConfig, axis: Axis) -> Warning {
    let normalized = axis == plot.measurement_axis() && plot.centile_normalized;
    let column = match (plot.var(axis), normalized) {
        (Some(var), true) => roichart_core::centile_column_name(var),
        (Some(var), false) => var.to_string(),
        (None, _) => String::new(),
    };
    Warning::MissingColumn { column }
}

fn series_range(values: &[f64], rows: &[usize]) -> Option<(f64, f64)> {
    let picked: Vec<f64> = rows.iter().map(|&row| values[row]).collect();
    value_range(&picked)
}

fn scatter_layers(
    input: &FigureInput<'_>,
    view: &PlotView,
    traces: &[TraceKind],
    figure: &mut Figure,
) {
    let plot = input.plot;
    let (Some(xs), Some(ys)) = (
        plot.axis_values(Axis::X, input.dataset, input.config),
        plot.axis_values(Axis::Y, input.dataset, input.config),
    ) else {
        for axis in [Axis::X, Axis::Y] {
            if plot.axis_values(axis, input.dataset, input.config).is_none() {
                figure.warnings.push(missing_axis(plot, axis));
            }
        }
        return;
    };
    let samples = input.config.curve_samples.max(2);

    for series in &view.series {
        let group = series.label.clone();
        if traces.contains(&TraceKind::Data) {
            figure.layers.push(Layer {
                name: TraceKind::Data.tag().to_string(),
                trace: Some(TraceKind::Data),
                group: group.clone(),
                geometry: Geometry::Points {
                    points: series.rows.iter().map(|&r| [xs[r], ys[r]]).collect(),
                    ids: series
                        .rows
                        .iter()
                        .filter_map(|&r| input.dataset.id(r).map(str::to_string))
                        .collect(),
                },
            });
        }

        let pairs = series_pairs(&xs, &ys, series);
        let Some((x_min, x_max)) = series_range(&xs, &series.rows) else {
            continue;
        };
        let grid = linspace(x_min, x_max, samples);

        if let Some(line) = LinearFit::fit(&pairs) {
            if traces.contains(&TraceKind::LinFit) {
                figure.layers.push(Layer {
                    name: TraceKind::LinFit.tag().to_string(),
                    trace: Some(TraceKind::LinFit),
                    group: group.clone(),
                    geometry: Geometry::Line {
                        points: grid.iter().map(|&x| [x, line.predict(x)]).collect(),
                    },
                });
            }
            if traces.contains(&TraceKind::Conf95) {
                let (lower, upper) = line.confidence_band(&grid);
                figure.layers.push(Layer {
                    name: TraceKind::Conf95.tag().to_string(),
                    trace: Some(TraceKind::Conf95),
                    group: group.clone(),
                    geometry: Geometry::Band { lower, upper },
                });
            }
        }

        if plot.trend == TrendKind::Smoothed {
            let curve = lowess(&pairs, plot.smoothing, LOWESS_ITERATIONS, &grid);
            if !curve.is_empty() {
                figure.layers.push(Layer {
                    name: LOWESS_LAYER.to_string(),
                    trace: None,
                    group,
                    geometry: Geometry::Line { points: curve },
                });
            }
        }
    }

    centile_layers(input, &xs, traces, figure);

    if traces.contains(&TraceKind::Selection) {
        if let Some(layer) = selection_marker(input, view, &xs, &ys) {
            figure.layers.push(layer);
        }
    }
}

fn series_pairs(xs: &[f64], ys: &[f64], series: &Series) -> Vec<(f64, f64)> {
    let x: Vec<f64> = series.rows.iter().map(|&r| xs[r]).collect();
    let y: Vec<f64> = series.rows.iter().map(|&r| ys[r]).collect();
    finite_pairs(&x, &y)
}

fn centile_layers(input: &FigureInput<'_>, xs: &[f64], traces: &[TraceKind], figure: &mut Figure) {
    let plot = input.plot;
    let levels: Vec<(TraceKind, f64)> = traces
        .iter()
        .filter_map(|&trace| trace.centile_level().map(|level| (trace, level)))
        .collect();
    if levels.is_empty() {
        return;
    }
    let Some(table) = input.reference else {
        figure.warnings.push(Warning::CentileUnavailable {
            kind: plot.centile_overlay.to_string(),
        });
        return;
    };
    let Some(roi) = plot.y_var.as_deref() else {
        return;
    };
    let span = plot
        .x_bounds
        .map(|b| (b.min, b.max))
        .or_else(|| value_range(xs));

    for (trace, level) in levels {
        let Some(index) = table.level_index(level) else {
            log::debug!("reference table has no level {level}");
            continue;
        };
        let points = if plot.centile_normalized {
            match span {
                Some((lo, hi)) => vec![[lo, level], [hi, level]],
                None => continue,
            }
        } else {
            table.curve(roi, index)
        };
        if points.is_empty() {
            log::debug!("reference table has no {roi} rows");
            continue;
        }
        figure.layers.push(Layer {
            name: trace.tag().to_string(),
            trace: Some(trace),
            group: None,
            geometry: Geometry::Line { points },
        });
    }
}

fn selection_marker(
    input: &FigureInput<'_>,
    view: &PlotView,
    xs: &[f64],
    ys: &[f64],
) -> Option<Layer> {
    let subject = input.selection.subject.as_deref()?;
    let row = input.dataset.row_of(subject)?;
    if !view.rows.contains(&row) {
        return None;
    }
    let point = [xs[row], ys[row]];
    if !point.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Layer {
        name: TraceKind::Selection.tag().to_string(),
        trace: Some(TraceKind::Selection),
        group: None,
        geometry: Geometry::Marker {
            point,
            subject: subject.to_string(),
        },
    })
}

fn distribution_layers(
    input: &FigureInput<'_>,
    view: &PlotView,
    traces: &[TraceKind],
    figure: &mut Figure,
) {
    let plot = input.plot;
    let Some(xs) = plot.axis_values(Axis::X, input.dataset, input.config) else {
        figure.warnings.push(missing_axis(plot, Axis::X));
        return;
    };
    let range = plot
        .x_bounds
        .map(|b| (b.min, b.max))
        .or_else(|| value_range(&xs));

    for series in &view.series {
        let values: Vec<f64> = series
            .rows
            .iter()
            .map(|&r| xs[r])
            .filter(|v| v.is_finite())
            .collect();
        let group = series.label.clone();

        if let (true, Some((lo, hi))) = (traces.contains(&TraceKind::Density), range) {
            let grid = linspace(lo, hi, input.config.curve_samples.max(2));
            if let Some(points) = gaussian_kde(&values, &grid) {
                figure.layers.push(Layer {
                    name: TraceKind::Density.tag().to_string(),
                    trace: Some(TraceKind::Density),
                    group: group.clone(),
                    geometry: Geometry::Line { points },
                });
            }
        }
        if traces.contains(&TraceKind::Rug) {
            figure.layers.push(Layer {
                name: TraceKind::Rug.tag().to_string(),
                trace: Some(TraceKind::Rug),
                group,
                geometry: Geometry::Rug { values },
            });
        }
    }
}
