//! Grid placement of plots.

use serde::Serialize;

use crate::plot::PlotId;

/// Position of one plot in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub plot: PlotId,
    pub row: usize,
    pub col: usize,
}

/// Grid of plots, row-major in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub per_row: usize,
    pub cells: Vec<GridCell>,
}

impl Layout {
    /// Number of grid rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.last().map_or(0, |cell| cell.row + 1)
    }

    /// Plots of one grid row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = PlotId> + '_ {
        self.cells
            .iter()
            .filter(move |cell| cell.row == row)
            .map(|cell| cell.plot)
    }
}

/// Places `plot_ids` on a grid `per_row` wide.
///
/// A width of zero is treated as one.
#[must_use]
pub fn layout(plot_ids: &[PlotId], per_row: usize) -> Layout {
    let per_row = per_row.max(1);
    let cells = plot_ids
        .iter()
        .enumerate()
        .map(|(index, &plot)| GridCell {
            plot,
            row: index / per_row,
            col: index % per_row,
        })
        .collect();
    Layout { per_row, cells }
}
