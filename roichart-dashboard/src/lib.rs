//! roichart-dashboard: Multi-plot dashboard state for regional brain volumes.
//!
//! This crate owns the plot registry, overlay trace composition, the shared
//! subject selection, grid layout and per-plot figure data. A
//! [`DashboardState`] holds one analysis session and is driven by
//! [`Command`] values.
//!

pub mod command;
pub mod config;
pub mod figure;
pub mod layout;
pub mod plot;
pub mod selection;
pub mod state;
pub mod traces;
pub mod view;

mod util;

pub use command::{Command, Warning};
pub use config::{DashboardConfig, PlotDefaults};
pub use figure::{build_figure, Figure, FigureInput, Geometry, Layer};
pub use layout::{layout, GridCell, Layout};
pub use plot::{
    Axis, FieldContext, ForcedField, PlotConfig, PlotField, PlotId, PlotKind, PlotRegistry,
    PlotUpdate, TraceKind, TrendKind, UpdateReport,
};
pub use selection::{resolve_click, ClickPayload, ClickResolution, ClickedPoint, Selection};
pub use state::{CentileCache, DashboardState};
pub use traces::{active_traces, legal_traces};
pub use view::{PlotView, Series};
