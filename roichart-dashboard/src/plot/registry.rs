use roichart_core::{CentileKind, Error, Result};

use super::update::{
    apply_update, enforce_age_overlay, scatter_traces, FieldContext, UpdateReport,
};
use super::{Axis, PlotConfig, PlotId, PlotKind, PlotUpdate, TraceKind, TrendKind};
use crate::config::PlotDefaults;

/// Ordered store of plot configurations.
///
/// Identifiers increase strictly and are not reused until [`reset`].
///
/// [`reset`]: PlotRegistry::reset
#[derive(Debug, Clone, Default)]
pub struct PlotRegistry {
    plots: Vec<PlotConfig>,
    next_id: u32,
}

impl PlotRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plot seeded from `defaults` and returns its identifier.
    ///
    /// Axis bounds are computed from `ctx` when given.
    pub fn add_plot(
        &mut self,
        defaults: &PlotDefaults,
        ctx: Option<&FieldContext<'_>>,
    ) -> PlotId {
        let id = PlotId::new(self.next_id);
        self.next_id += 1;

        let mut plot = PlotConfig {
            id,
            kind: defaults.kind,
            x_var: defaults.x_var.clone(),
            x_bounds: None,
            y_var: defaults.y_var.clone(),
            y_bounds: None,
            group_by: defaults.group_by.clone(),
            group_values: Vec::new(),
            correct_icv: false,
            centile_normalized: false,
            trend: defaults.trend,
            smoothing: defaults.smoothing,
            traces: defaults.traces.clone(),
            centile_overlay: defaults.centile_overlay,
        };
        match plot.kind {
            PlotKind::Distribution => {
                plot.trend = TrendKind::None;
                plot.centile_overlay = CentileKind::None;
                plot.traces = TraceKind::DISTRIBUTION.into_iter().collect();
            }
            PlotKind::Scatter => plot.traces = scatter_traces(&plot, &defaults.traces),
        }
        if let Some(ctx) = ctx {
            if plot.kind == PlotKind::Scatter {
                let mut report = UpdateReport::default();
                enforce_age_overlay(&mut plot, ctx, &mut report);
                for forced in report.forced {
                    log::debug!("{id}: {} {}", forced.field, forced.reason);
                }
            }
            plot.refresh_bounds(Axis::X, ctx.dataset, ctx.config);
            plot.refresh_bounds(Axis::Y, ctx.dataset, ctx.config);
        }
        log::debug!("added {id}");
        self.plots.push(plot);
        id
    }

    /// Deletes a plot. Unknown identifiers are ignored.
    ///
    /// Returns true if a plot was removed.
    pub fn remove_plot(&mut self, id: PlotId) -> bool {
        let before = self.plots.len();
        self.plots.retain(|plot| plot.id != id);
        before != self.plots.len()
    }

    /// Applies one field update with its side effects.
    ///
    /// The update runs against a copy that replaces the stored record only
    /// on success, so a failed update leaves the registry unchanged.
    ///
    /// # Errors
    /// Returns [`Error::UnknownPlot`] for an unknown identifier and
    /// [`Error::Validation`] for a value the plot cannot take.
    pub fn update_field(
        &mut self,
        id: PlotId,
        update: PlotUpdate,
        ctx: &FieldContext<'_>,
    ) -> Result<UpdateReport> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::UnknownPlot(id.to_string()))?;
        let mut draft = self.plots[index].clone();
        let report = apply_update(&mut draft, update, ctx)?;
        self.plots[index] = draft;
        Ok(report)
    }

    /// Parses and applies a textual field update.
    ///
    /// # Errors
    /// Returns [`Error::InvalidField`] for an unknown field name, otherwise
    /// see [`PlotRegistry::update_field`].
    pub fn update_field_str(
        &mut self,
        id: PlotId,
        field: &str,
        value: &str,
        ctx: &FieldContext<'_>,
    ) -> Result<UpdateReport> {
        let update = PlotUpdate::parse(field, value)?;
        self.update_field(id, update, ctx)
    }

    /// Removes every plot and restarts numbering.
    pub fn reset(&mut self) {
        self.plots.clear();
        self.next_id = 0;
    }

    #[must_use]
    pub fn get(&self, id: PlotId) -> Option<&PlotConfig> {
        self.plots.iter().find(|plot| plot.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlotConfig> {
        self.plots.iter()
    }

    /// Identifiers in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<PlotId> {
        self.plots.iter().map(|plot| plot.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    fn position(&self, id: PlotId) -> Option<usize> {
        self.plots.iter().position(|plot| plot.id == id)
    }
}
