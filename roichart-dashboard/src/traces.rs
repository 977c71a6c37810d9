//! Active overlay layers of a plot.

use crate::config::DashboardConfig;
use crate::plot::{PlotConfig, PlotKind, TraceKind, TrendKind};
use crate::selection::Selection;

/// Every layer a plot kind can draw.
#[must_use]
pub fn legal_traces(kind: PlotKind) -> &'static [TraceKind] {
    match kind {
        PlotKind::Scatter => &[
            TraceKind::Data,
            TraceKind::LinFit,
            TraceKind::Conf95,
            TraceKind::Centile5,
            TraceKind::Centile25,
            TraceKind::Centile50,
            TraceKind::Centile75,
            TraceKind::Centile95,
            TraceKind::Selection,
        ],
        PlotKind::Distribution => &TraceKind::DISTRIBUTION,
    }
}

/// Layers to draw for `plot`, in draw order.
///
/// Requested layers whose prerequisites are not met are left out.
#[must_use]
pub fn active_traces(
    plot: &PlotConfig,
    selection: &Selection,
    config: &DashboardConfig,
) -> Vec<TraceKind> {
    let legal = legal_traces(plot.kind);
    let mut out: Vec<TraceKind> = match plot.kind {
        PlotKind::Scatter => {
            let linear = plot.trend == TrendKind::Linear;
            let centiles = !plot.centile_overlay.is_none() && plot.is_age_axis(config);
            let mut traces: Vec<TraceKind> = std::iter::once(TraceKind::Data)
                .chain(plot.traces.iter().copied().filter(|trace| {
                    (linear && TraceKind::LINEAR_FIT.contains(trace))
                        || (centiles && trace.is_centile())
                }))
                .collect();
            if selection.subject.is_some() {
                traces.push(TraceKind::Selection);
            }
            traces
        }
        PlotKind::Distribution => TraceKind::DISTRIBUTION.to_vec(),
    };
    out.retain(|trace| legal.contains(trace));
    out.sort();
    out.dedup();
    out
}
