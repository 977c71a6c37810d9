//! Field updates and their side effects.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use roichart_core::{centile_column_name, CentileKind, Dataset, Error, Result};
use serde::{Deserialize, Serialize};

use super::{Axis, PlotConfig, PlotKind, TraceKind, TrendKind};
use crate::config::DashboardConfig;

/// Name of an updatable plot attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotField {
    Kind,
    XVar,
    YVar,
    GroupBy,
    GroupValues,
    CorrectIcv,
    CentileNormalized,
    Trend,
    Smoothing,
    Traces,
    CentileOverlay,
}

impl PlotField {
    pub const ALL: [PlotField; 11] = [
        PlotField::Kind,
        PlotField::XVar,
        PlotField::YVar,
        PlotField::GroupBy,
        PlotField::GroupValues,
        PlotField::CorrectIcv,
        PlotField::CentileNormalized,
        PlotField::Trend,
        PlotField::Smoothing,
        PlotField::Traces,
        PlotField::CentileOverlay,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PlotField::Kind => "kind",
            PlotField::XVar => "x_var",
            PlotField::YVar => "y_var",
            PlotField::GroupBy => "group_by",
            PlotField::GroupValues => "group_values",
            PlotField::CorrectIcv => "correct_icv",
            PlotField::CentileNormalized => "centile_normalized",
            PlotField::Trend => "trend",
            PlotField::Smoothing => "smoothing",
            PlotField::Traces => "traces",
            PlotField::CentileOverlay => "centile_overlay",
        }
    }
}

impl fmt::Display for PlotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PlotField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| Error::InvalidField(s.to_string()))
    }
}

/// A single typed attribute change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PlotUpdate {
    Kind(PlotKind),
    XVar(String),
    YVar(String),
    GroupBy(Option<String>),
    GroupValues(Vec<String>),
    CorrectIcv(bool),
    CentileNormalized(bool),
    Trend(TrendKind),
    Smoothing(f64),
    Traces(BTreeSet<TraceKind>),
    CentileOverlay(CentileKind),
}

impl PlotUpdate {
    /// Parses a textual field/value pair.
    ///
    /// Lists are comma separated; an empty group variable means ungrouped.
    ///
    /// # Errors
    /// Returns [`Error::InvalidField`] for an unknown field name and
    /// [`Error::Validation`] for a value of the wrong shape.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        let field: PlotField = field.parse()?;
        let value = value.trim();
        let list = || -> Vec<&str> {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect()
        };
        let flag = || -> Result<bool> {
            value.parse::<bool>().map_err(|_| {
                Error::validation(field.name(), format!("expected true or false, got {value}"))
            })
        };
        Ok(match field {
            PlotField::Kind => PlotUpdate::Kind(value.parse()?),
            PlotField::XVar => PlotUpdate::XVar(value.to_string()),
            PlotField::YVar => PlotUpdate::YVar(value.to_string()),
            PlotField::GroupBy => {
                PlotUpdate::GroupBy((!value.is_empty()).then(|| value.to_string()))
            }
            PlotField::GroupValues => {
                PlotUpdate::GroupValues(list().into_iter().map(str::to_string).collect())
            }
            PlotField::CorrectIcv => PlotUpdate::CorrectIcv(flag()?),
            PlotField::CentileNormalized => PlotUpdate::CentileNormalized(flag()?),
            PlotField::Trend => PlotUpdate::Trend(value.parse()?),
            PlotField::Smoothing => PlotUpdate::Smoothing(value.parse::<f64>().map_err(|_| {
                Error::validation(field.name(), format!("expected a number, got {value}"))
            })?),
            PlotField::Traces => PlotUpdate::Traces(
                list()
                    .into_iter()
                    .map(str::parse)
                    .collect::<Result<BTreeSet<TraceKind>>>()?,
            ),
            PlotField::CentileOverlay => PlotUpdate::CentileOverlay(value.parse()?),
        })
    }

    #[must_use]
    pub fn field(&self) -> PlotField {
        match self {
            PlotUpdate::Kind(_) => PlotField::Kind,
            PlotUpdate::XVar(_) => PlotField::XVar,
            PlotUpdate::YVar(_) => PlotField::YVar,
            PlotUpdate::GroupBy(_) => PlotField::GroupBy,
            PlotUpdate::GroupValues(_) => PlotField::GroupValues,
            PlotUpdate::CorrectIcv(_) => PlotField::CorrectIcv,
            PlotUpdate::CentileNormalized(_) => PlotField::CentileNormalized,
            PlotUpdate::Trend(_) => PlotField::Trend,
            PlotUpdate::Smoothing(_) => PlotField::Smoothing,
            PlotUpdate::Traces(_) => PlotField::Traces,
            PlotUpdate::CentileOverlay(_) => PlotField::CentileOverlay,
        }
    }
}

/// Data an update is validated against.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    pub dataset: &'a Dataset,
    pub config: &'a DashboardConfig,
}

/// A field the registry set to a different value than requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForcedField {
    pub field: PlotField,
    pub reason: String,
}

/// Side effects of an applied update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
    pub forced: Vec<ForcedField>,
}

impl UpdateReport {
    fn force(&mut self, field: PlotField, reason: impl Into<String>) {
        self.forced.push(ForcedField {
            field,
            reason: reason.into(),
        });
    }
}

fn require_numeric(ctx: &FieldContext<'_>, field: PlotField, var: &str) -> Result<()> {
    match ctx.dataset.column(var) {
        None => Err(Error::validation(field.name(), format!("no column named {var}"))),
        Some(column) if !column.is_numeric() => Err(Error::validation(
            field.name(),
            format!("{var} is not a numeric column"),
        )),
        Some(_) => Ok(()),
    }
}

fn scatter_only(plot: &PlotConfig, field: PlotField) -> Result<()> {
    if plot.kind == PlotKind::Scatter {
        Ok(())
    } else {
        Err(Error::validation(
            field.name(),
            "only applies to scatter plots",
        ))
    }
}

/// Drops centile layers and the overlay when the x axis is not age.
pub(super) fn enforce_age_overlay(
    plot: &mut PlotConfig,
    ctx: &FieldContext<'_>,
    report: &mut UpdateReport,
) {
    if plot.is_age_axis(ctx.config) {
        return;
    }
    plot.traces.retain(|trace| !trace.is_centile());
    if !plot.centile_overlay.is_none() {
        plot.centile_overlay = CentileKind::None;
        report.force(
            PlotField::CentileOverlay,
            format!("centile overlays need {} on the x axis", ctx.config.age_variable),
        );
    }
}

/// Turns normalization off when the measurement has no centile column.
fn enforce_normalization(plot: &mut PlotConfig, ctx: &FieldContext<'_>, report: &mut UpdateReport) {
    if !plot.centile_normalized {
        return;
    }
    let available = plot
        .y_var
        .as_deref()
        .is_some_and(|var| ctx.dataset.numeric(&centile_column_name(var)).is_some());
    if !available {
        plot.centile_normalized = false;
        report.force(
            PlotField::CentileNormalized,
            "no centile scores for the y variable",
        );
    }
}

pub(super) fn scatter_traces(
    plot: &PlotConfig,
    requested: &BTreeSet<TraceKind>,
) -> BTreeSet<TraceKind> {
    let mut traces: BTreeSet<TraceKind> = requested
        .iter()
        .copied()
        .filter(|trace| match trace {
            TraceKind::Data => true,
            TraceKind::LinFit | TraceKind::Conf95 => plot.trend == TrendKind::Linear,
            t if t.is_centile() => !plot.centile_overlay.is_none(),
            _ => false,
        })
        .collect();
    traces.insert(TraceKind::Data);
    traces
}

/// Applies `update` to `plot`, including every dependent change.
///
/// On error `plot` may be partially modified; callers apply updates to a
/// copy and commit it only on success.
pub(crate) fn apply_update(
    plot: &mut PlotConfig,
    update: PlotUpdate,
    ctx: &FieldContext<'_>,
) -> Result<UpdateReport> {
    let mut report = UpdateReport::default();
    let field = update.field();
    match update {
        PlotUpdate::Kind(kind) => {
            if kind != plot.kind {
                plot.kind = kind;
                match kind {
                    PlotKind::Distribution => {
                        plot.trend = TrendKind::None;
                        plot.centile_overlay = CentileKind::None;
                        plot.centile_normalized = false;
                        plot.traces = TraceKind::DISTRIBUTION.into_iter().collect();
                    }
                    PlotKind::Scatter => {
                        plot.traces = scatter_traces(plot, &BTreeSet::new());
                    }
                }
                plot.refresh_bounds(Axis::X, ctx.dataset, ctx.config);
                plot.refresh_bounds(Axis::Y, ctx.dataset, ctx.config);
            }
        }
        PlotUpdate::XVar(var) => {
            require_numeric(ctx, field, &var)?;
            plot.x_var = Some(var);
            enforce_age_overlay(plot, ctx, &mut report);
            plot.refresh_bounds(Axis::X, ctx.dataset, ctx.config);
        }
        PlotUpdate::YVar(var) => {
            scatter_only(plot, field)?;
            require_numeric(ctx, field, &var)?;
            plot.y_var = Some(var);
            enforce_normalization(plot, ctx, &mut report);
            plot.refresh_bounds(Axis::Y, ctx.dataset, ctx.config);
        }
        PlotUpdate::GroupBy(group) => {
            if let Some(name) = &group {
                if !ctx.dataset.has_column(name) {
                    return Err(Error::validation(field.name(), format!("no column named {name}")));
                }
            }
            if group != plot.group_by {
                plot.group_values.clear();
            }
            plot.group_by = group;
        }
        PlotUpdate::GroupValues(values) => {
            let Some(group) = plot.group_by.as_deref() else {
                return Err(Error::validation(field.name(), "plot is not grouped"));
            };
            let labels = ctx.dataset.group_labels(group).unwrap_or_default();
            let mut chosen: Vec<String> = Vec::with_capacity(values.len());
            for value in values {
                if !labels.contains(&value) {
                    return Err(Error::validation(
                        field.name(),
                        format!("{value} is not a value of {group}"),
                    ));
                }
                if !chosen.contains(&value) {
                    chosen.push(value);
                }
            }
            plot.group_values = chosen;
        }
        PlotUpdate::CorrectIcv(enabled) => {
            if enabled && ctx.dataset.numeric(&ctx.config.icv_variable).is_none() {
                return Err(Error::validation(
                    field.name(),
                    format!("dataset has no numeric {} column", ctx.config.icv_variable),
                ));
            }
            plot.correct_icv = enabled;
            let axis = plot.measurement_axis();
            plot.refresh_bounds(axis, ctx.dataset, ctx.config);
        }
        PlotUpdate::CentileNormalized(enabled) => {
            scatter_only(plot, field)?;
            plot.centile_normalized = enabled;
            enforce_normalization(plot, ctx, &mut report);
            plot.refresh_bounds(Axis::Y, ctx.dataset, ctx.config);
        }
        PlotUpdate::Trend(trend) => {
            if plot.kind == PlotKind::Distribution && trend != TrendKind::None {
                return Err(Error::validation(
                    field.name(),
                    "distribution plots have no trend",
                ));
            }
            plot.trend = trend;
            if trend == TrendKind::Linear {
                plot.traces.insert(TraceKind::LinFit);
            } else {
                plot.traces
                    .retain(|trace| !TraceKind::LINEAR_FIT.contains(trace));
            }
        }
        PlotUpdate::Smoothing(span) => {
            if plot.kind != PlotKind::Scatter || plot.trend != TrendKind::Smoothed {
                return Err(Error::validation(
                    field.name(),
                    "smoothing applies to the smoothed trend only",
                ));
            }
            let range = ctx.config.smoothing_range();
            if !range.contains(&span) {
                return Err(Error::validation(
                    field.name(),
                    format!("{span} outside {}..={}", range.start(), range.end()),
                ));
            }
            plot.smoothing = span;
        }
        PlotUpdate::Traces(requested) => {
            let traces = match plot.kind {
                PlotKind::Scatter => scatter_traces(plot, &requested),
                PlotKind::Distribution => TraceKind::DISTRIBUTION.into_iter().collect(),
            };
            if traces != requested {
                report.force(field, "traces not available for the current settings were dropped");
            }
            plot.traces = traces;
        }
        PlotUpdate::CentileOverlay(kind) => {
            if plot.kind == PlotKind::Distribution {
                if !kind.is_none() {
                    report.force(field, "distribution plots have no centile overlay");
                }
                return Ok(report);
            }
            plot.centile_overlay = kind;
            if kind.is_none() {
                plot.traces.retain(|trace| !trace.is_centile());
            } else {
                plot.traces.extend(TraceKind::CENTILES);
            }
            enforce_age_overlay(plot, ctx, &mut report);
        }
    }
    Ok(report)
}
