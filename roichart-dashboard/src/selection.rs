//! Shared subject selection and click resolution.

use roichart_core::Dataset;
use serde::{Deserialize, Serialize};

use crate::plot::{PlotConfig, PlotKind};
use crate::view::PlotView;

/// Subject and ROI highlighted across every plot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub subject: Option<String>,
    pub roi: Option<String>,
}

impl Selection {
    /// Clears subject and ROI.
    pub fn clear(&mut self) {
        self.subject = None;
        self.roi = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.roi.is_none()
    }
}

/// One clicked point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickedPoint {
    /// Index within the clicked series.
    pub point_index: usize,
    /// Legend label of the clicked series, for grouped plots.
    #[serde(default)]
    pub legend_group: Option<String>,
}

/// Click event reported by a plot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickPayload {
    #[serde(default)]
    pub points: Vec<ClickedPoint>,
}

impl ClickPayload {
    /// Payload for a single point.
    #[must_use]
    pub fn point(point_index: usize, legend_group: Option<&str>) -> Self {
        Self {
            points: vec![ClickedPoint {
                point_index,
                legend_group: legend_group.map(str::to_string),
            }],
        }
    }
}

/// What a click resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickResolution {
    /// The payload held no point.
    Empty,
    /// A subject was hit.
    Subject { id: String, roi: Option<String> },
    /// The click could not be mapped to a subject.
    Ignored(String),
}

/// Maps a click on `plot` back to the subject it hit.
///
/// Only the first point of the payload is used.
#[must_use]
pub fn resolve_click(
    dataset: &Dataset,
    plot: &PlotConfig,
    payload: &ClickPayload,
) -> ClickResolution {
    let Some(point) = payload.points.first() else {
        return ClickResolution::Empty;
    };
    if plot.kind == PlotKind::Distribution {
        return ClickResolution::Ignored("distribution plots are not selectable".to_string());
    }

    let view = PlotView::derive(dataset, plot);
    let rows = if view.is_grouped() {
        let Some(label) = point.legend_group.as_deref() else {
            return ClickResolution::Ignored("grouped plot click without legend group".to_string());
        };
        match view.series(label) {
            Some(series) => &series.rows,
            None => return ClickResolution::Ignored(format!("no rendered group {label}")),
        }
    } else {
        &view.rows
    };

    let Some(id) = rows.get(point.point_index).and_then(|&row| dataset.id(row)) else {
        return ClickResolution::Ignored(format!(
            "point {} outside the {} rendered rows",
            point.point_index,
            rows.len()
        ));
    };
    ClickResolution::Subject {
        id: id.to_string(),
        roi: plot.y_var.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotDefaults;
    use crate::plot::PlotRegistry;
    use roichart_core::Column;

    fn dataset() -> Dataset {
        Dataset::new("MRID", (1..=5).map(|i| format!("S{i}")).collect())
            .unwrap()
            .with_column(
                "Sex",
                Column::Categorical(
                    ["Male", "Female", "Male", "Female", "Female"]
                        .map(String::from)
                        .to_vec(),
                ),
            )
            .unwrap()
    }

    fn plot(group_by: Option<&str>) -> PlotConfig {
        let mut registry = PlotRegistry::new();
        let defaults = PlotDefaults {
            group_by: group_by.map(String::from),
            ..PlotDefaults::default()
        };
        let id = registry.add_plot(&defaults, None);
        registry.get(id).unwrap().clone()
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(
            resolve_click(&dataset(), &plot(None), &ClickPayload::default()),
            ClickResolution::Empty
        );
    }

    #[test]
    fn test_ungrouped_click() {
        let out = resolve_click(&dataset(), &plot(None), &ClickPayload::point(1, None));
        assert_eq!(
            out,
            ClickResolution::Subject {
                id: "S2".into(),
                roi: Some("GM".into())
            }
        );
    }

    #[test]
    fn test_grouped_click_uses_legend() {
        let out = resolve_click(
            &dataset(),
            &plot(Some("Sex")),
            &ClickPayload::point(2, Some("Female")),
        );
        assert!(matches!(out, ClickResolution::Subject { id, .. } if id == "S5"));
    }

    #[test]
    fn test_grouped_click_without_legend() {
        let out = resolve_click(&dataset(), &plot(Some("Sex")), &ClickPayload::point(0, None));
        assert!(matches!(out, ClickResolution::Ignored(_)));
    }

    #[test]
    fn test_out_of_range_click() {
        let out = resolve_click(
            &dataset(),
            &plot(Some("Sex")),
            &ClickPayload::point(2, Some("Male")),
        );
        assert!(matches!(out, ClickResolution::Ignored(_)));
    }
}
