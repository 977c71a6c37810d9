//! Rows rendered by a plot.
//!
//! Drawing and click handling both derive the view from here so that a
//! point index always maps back to the same subject.

use roichart_core::Dataset;

use crate::plot::PlotConfig;

/// Rows of one legend group, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Group label; `None` for an ungrouped plot.
    pub label: Option<String>,
    pub rows: Vec<usize>,
}

/// Filtered and grouped rows of a plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotView {
    /// Every rendered row, in dataset order.
    pub rows: Vec<usize>,
    /// One entry per legend group, ordered by sorted group label.
    pub series: Vec<Series>,
}

impl PlotView {
    /// Derives the view of `plot` over `dataset`.
    ///
    /// A grouped plot keeps the rows whose group label is among the
    /// selected values (all labels when none are selected).
    #[must_use]
    pub fn derive(dataset: &Dataset, plot: &PlotConfig) -> Self {
        let grouping = plot
            .group_by
            .as_deref()
            .and_then(|name| Some((dataset.column(name)?, dataset.group_labels(name)?)));

        let Some((column, labels)) = grouping else {
            let rows: Vec<usize> = (0..dataset.len()).collect();
            return Self {
                series: vec![Series {
                    label: None,
                    rows: rows.clone(),
                }],
                rows,
            };
        };

        let shown: Vec<String> = labels
            .into_iter()
            .filter(|label| plot.group_values.is_empty() || plot.group_values.contains(label))
            .collect();
        let row_labels: Vec<Option<String>> =
            (0..dataset.len()).map(|row| column.label(row)).collect();

        let rows: Vec<usize> = row_labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.as_ref().is_some_and(|l| shown.contains(l)))
            .map(|(row, _)| row)
            .collect();
        let series = shown
            .into_iter()
            .map(|label| Series {
                rows: rows
                    .iter()
                    .copied()
                    .filter(|&row| row_labels[row].as_deref() == Some(label.as_str()))
                    .collect(),
                label: Some(label),
            })
            .filter(|series| !series.rows.is_empty())
            .collect();
        Self { rows, series }
    }

    /// Returns true if the plot is split into legend groups.
    #[must_use]
    pub fn is_grouped(&self) -> bool {
        self.series.iter().any(|series| series.label.is_some())
    }

    /// Series with the given legend label.
    #[must_use]
    pub fn series(&self, label: &str) -> Option<&Series> {
        self.series
            .iter()
            .find(|series| series.label.as_deref() == Some(label))
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
                Column::Categorical(["M", "F", "M", "F", "F"].map(String::from).to_vec()),
            )
            .unwrap()
    }

    fn plot(group_by: Option<&str>, values: &[&str]) -> PlotConfig {
        let mut registry = PlotRegistry::new();
        let defaults = PlotDefaults {
            group_by: group_by.map(String::from),
            ..PlotDefaults::default()
        };
        let id = registry.add_plot(&defaults, None);
        let mut plot = registry.get(id).unwrap().clone();
        plot.group_values = values.iter().map(|v| (*v).to_string()).collect();
        plot
    }

    #[test]
    fn test_ungrouped_view() {
        let view = PlotView::derive(&dataset(), &plot(None, &[]));
        assert_eq!(view.rows, vec![0, 1, 2, 3, 4]);
        assert!(!view.is_grouped());
    }

    #[test]
    fn test_grouped_view_sorted_by_label() {
        let view = PlotView::derive(&dataset(), &plot(Some("Sex"), &[]));
        let labels: Vec<_> = view.series.iter().map(|s| s.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["F", "M"]);
        assert_eq!(view.series("F").unwrap().rows, vec![1, 3, 4]);
        assert_eq!(view.series("M").unwrap().rows, vec![0, 2]);
    }

    #[test]
    fn test_group_filter() {
        let view = PlotView::derive(&dataset(), &plot(Some("Sex"), &["M"]));
        assert_eq!(view.rows, vec![0, 2]);
        assert!(view.series("F").is_none());
    }
}
