//! User actions and the warnings they can produce.

use std::fmt;

use roichart_core::{AmbiguousCentile, Dataset};
use serde::{Deserialize, Serialize};

use crate::plot::{PlotField, PlotId, PlotKind, PlotUpdate};
use crate::selection::ClickPayload;

/// One user interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Appends a plot seeded from the working defaults.
    AddPlot,
    DeletePlot {
        plot: PlotId,
    },
    UpdateField {
        plot: PlotId,
        update: PlotUpdate,
    },
    SelectPoint {
        plot: PlotId,
        #[serde(default)]
        payload: ClickPayload,
    },
    ChangePerRow {
        per_row: usize,
    },
    /// Sets the kind used by newly added plots.
    SelectPlotKind {
        kind: PlotKind,
    },
    SelectSubject {
        subject: Option<String>,
    },
    SelectRoi {
        roi: Option<String>,
    },
    ClearSelection,
    /// Swaps the active dataset and resets every plot.
    #[serde(skip)]
    ReplaceDataset(Box<Dataset>),
}

impl Command {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddPlot => "add_plot",
            Command::DeletePlot { .. } => "delete_plot",
            Command::UpdateField { .. } => "update_field",
            Command::SelectPoint { .. } => "select_point",
            Command::ChangePerRow { .. } => "change_per_row",
            Command::SelectPlotKind { .. } => "select_plot_kind",
            Command::SelectSubject { .. } => "select_subject",
            Command::SelectRoi { .. } => "select_roi",
            Command::ClearSelection => "clear_selection",
            Command::ReplaceDataset(_) => "replace_dataset",
        }
    }
}

/// Non-fatal condition reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// The dataset has no rows.
    EmptyDataset,
    /// The dataset has no numeric column to plot.
    NoNumericColumns,
    MissingColumn {
        column: String,
    },
    AmbiguousCentile {
        roi: String,
        lower_level: f64,
        upper_level: f64,
    },
    /// No reference table is loaded for an overlay.
    CentileUnavailable {
        kind: String,
    },
    ForcedField {
        plot: PlotId,
        field: PlotField,
        reason: String,
    },
    IgnoredClick {
        plot: PlotId,
        reason: String,
    },
}

impl From<AmbiguousCentile> for Warning {
    fn from(value: AmbiguousCentile) -> Self {
        Warning::AmbiguousCentile {
            roi: value.roi,
            lower_level: value.lower_level,
            upper_level: value.upper_level,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyDataset => write!(f, "dataset has no rows"),
            Warning::NoNumericColumns => write!(f, "no numeric columns to plot"),
            Warning::MissingColumn { column } => write!(f, "column not found: {column}"),
            Warning::AmbiguousCentile {
                roi,
                lower_level,
                upper_level,
            } => write!(
                f,
                "ambiguous centile for {roi} between levels {lower_level} and {upper_level}"
            ),
            Warning::CentileUnavailable { kind } => {
                write!(f, "no reference centiles loaded for {kind}")
            }
            Warning::ForcedField {
                plot,
                field,
                reason,
            } => write!(f, "{plot}: {field} forced, {reason}"),
            Warning::IgnoredClick { plot, reason } => write!(f, "{plot}: click ignored, {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::TrendKind;

    #[test]
    fn test_command_json() {
        let json = r#"[
            {"command": "add_plot"},
            {"command": "update_field", "plot": 0, "update": {"field": "trend", "value": "none"}},
            {"command": "select_point", "plot": 0, "payload": {"points": [{"point_index": 2, "legend_group": "F"}]}},
            {"command": "change_per_row", "per_row": 3},
            {"command": "select_subject", "subject": null}
        ]"#;
        let commands: Vec<Command> = serde_json::from_str(json).unwrap();
        assert_eq!(commands.len(), 5);
        assert!(matches!(
            &commands[1],
            Command::UpdateField { update: PlotUpdate::Trend(TrendKind::None), .. }
        ));
        assert!(matches!(
            &commands[2],
            Command::SelectPoint { payload, .. } if payload.points[0].point_index == 2
        ));
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::IgnoredClick {
            plot: PlotId::new(1),
            reason: "no point".into(),
        };
        assert_eq!(warning.to_string(), "Plot1: click ignored, no point");
    }
}
