//! Triangular (corner-plot) grid and stacked row layouts.
//!
//! Geometry is computed in inches and converted to figure fractions:
//!
//! ```text
//! | pad | col 0 | gap | col 1 | ... | col n-1 | cbar gap | colorbar | pad |
//! ```
//!
//! The space left after padding (and the colorbar strip, when present) is
//! divided evenly among the `n` rows and columns.

use crate::error::AppError;
use crate::figure::{Figure, Rect, Region, RegionId, RegionKind, TickSide};

/// Conversion factor from centimeters to inches.
pub const INCH_PER_CM: f64 = 0.393700787;

/// Gap between the grid and the colorbar strip (figure fraction).
const CBAR_GAP: f64 = 0.02;

/// Geometry options for [`make_axes_grid`] and [`make_row_layout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    /// Figure width and height in inches.
    pub figure_size: (f64, f64),
    /// Total outer padding per dimension (cm), split evenly between both sides.
    pub padding_cm: f64,
    /// Width of the colorbar strip including its labels (cm).
    pub cbar_size_cm: f64,
    /// Padding between neighbouring axes (cm).
    pub axis_padding_cm: f64,
    pub cbar: bool,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            figure_size: (6.4, 4.8),
            padding_cm: 2.54,
            cbar_size_cm: 1.2,
            axis_padding_cm: 0.5,
            cbar: true,
        }
    }
}

impl GridOptions {
    /// Defaults with a figure large enough for `n` rows and columns.
    pub fn for_count(n: usize) -> Self {
        let n = n as f64;
        Self {
            figure_size: ((2.2 * n + 1.6).max(6.4), (2.0 * n + 1.2).max(4.8)),
            ..Self::default()
        }
    }
}

/// Region handles of a triangular grid; entries above the diagonal are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxesGrid {
    cells: Vec<Vec<Option<RegionId>>>,
    pub colorbar: Option<RegionId>,
}

impl AxesGrid {
    pub fn n(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<RegionId> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    pub fn diagonal(&self, i: usize) -> RegionId {
        // Diagonal cells are always populated.
        self.cells[i][i].unwrap_or(RegionId(usize::MAX))
    }

    /// Strictly-lower-triangle indices `(row, col)`, row-major.
    pub fn lower_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.n();
        (0..n).flat_map(|i| (0..i).map(move |j| (i, j))).collect()
    }

    pub fn populated(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

struct Geometry {
    pad_x: f64,
    pad_y: f64,
    gap_x: f64,
    gap_y: f64,
    cell_w: f64,
    cell_h: f64,
    cbar_w: f64,
}

fn geometry(n: usize, rows: usize, options: &GridOptions) -> Result<Geometry, AppError> {
    let (fig_w, fig_h) = options.figure_size;
    if !(fig_w.is_finite() && fig_h.is_finite() && fig_w > 0.0 && fig_h > 0.0) {
        return Err(AppError::input(format!(
            "Invalid figure size {fig_w}x{fig_h} (inches)."
        )));
    }
    if [options.padding_cm, options.cbar_size_cm, options.axis_padding_cm]
        .iter()
        .any(|v| !(v.is_finite() && *v >= 0.0))
    {
        return Err(AppError::input("Grid paddings and colorbar size must be finite and >= 0."));
    }

    let pad_x = 0.5 * options.padding_cm * INCH_PER_CM / fig_w;
    let pad_y = 0.5 * options.padding_cm * INCH_PER_CM / fig_h;
    let gap_x = options.axis_padding_cm * INCH_PER_CM / fig_w;
    let gap_y = options.axis_padding_cm * INCH_PER_CM / fig_h;
    let cbar_w = if options.cbar {
        options.cbar_size_cm * INCH_PER_CM / fig_w
    } else {
        0.0
    };
    let strip = if options.cbar { cbar_w + CBAR_GAP } else { 0.0 };

    let cell_w = (1.0 - 2.0 * pad_x - strip - (n as f64 - 1.0) * gap_x) / n as f64;
    let cell_h = (1.0 - 2.0 * pad_y - (rows as f64 - 1.0) * gap_y) / rows as f64;
    if !(cell_w > 0.0 && cell_h > 0.0) {
        return Err(AppError::input(format!(
            "Figure {fig_w}x{fig_h} in is too small for {n} columns and {rows} rows with the given padding."
        )));
    }

    Ok(Geometry {
        pad_x,
        pad_y,
        gap_x,
        gap_y,
        cell_w,
        cell_h,
        cbar_w,
    })
}

/// Build a triangular grid of `n × n` regions (lower triangle + diagonal).
///
/// - diagonal `(i,i)`: y ticks on the right
/// - off-diagonal `(i,j)`: x shared with `(j,j)`, y shared with `(i,i-1)`
/// - x tick labels only in the bottom row, y tick labels only in column 0
pub fn make_axes_grid(n: usize, options: &GridOptions) -> Result<(Figure, AxesGrid), AppError> {
    if n == 0 {
        return Err(AppError::new(3, "Cannot build an axes grid for zero parameters."));
    }
    let g = geometry(n, n, options)?;
    let mut figure = Figure::new(options.figure_size.0, options.figure_size.1);
    let mut cells: Vec<Vec<Option<RegionId>>> = vec![vec![None; n]; n];

    for i in 0..n {
        let row_from_bottom = n - 1 - i;
        // Right to left, so the row's y-axis anchor `(i, i-1)` exists before
        // the cells that share it.
        for j in (0..=i).rev() {
            let rect = Rect {
                left: g.pad_x + j as f64 * (g.cell_w + g.gap_x),
                bottom: g.pad_y + row_from_bottom as f64 * (g.cell_h + g.gap_y),
                width: g.cell_w,
                height: g.cell_h,
            };
            let kind = if i == j {
                RegionKind::Diagonal
            } else {
                RegionKind::OffDiagonal
            };
            let mut region = Region::new(kind, rect);
            if i != j {
                region.share_x = cells[j][j];
                if i - 1 != j {
                    region.share_y = cells[i][i - 1];
                }
            } else {
                region.y_axis.side = TickSide::Right;
            }
            region.x_axis.labels = i == n - 1;
            region.y_axis.labels = j == 0;
            cells[i][j] = Some(figure.add_region(region));
        }
    }

    let colorbar = options.cbar.then(|| {
        let rect = Rect {
            left: g.pad_x + n as f64 * g.cell_w + (n as f64 - 1.0) * g.gap_x + CBAR_GAP,
            bottom: g.pad_y,
            width: g.cbar_w,
            height: n as f64 * g.cell_h + (n as f64 - 1.0) * g.gap_y,
        };
        let mut region = Region::new(RegionKind::Colorbar, rect);
        region.x_axis.hide();
        region.y_axis.hide();
        figure.add_region(region)
    });

    Ok((figure, AxesGrid { cells, colorbar }))
}

/// Build `n` stacked regions sharing the x axis of the top one; only the
/// bottom region shows x tick labels.
pub fn make_row_layout(n: usize, options: &GridOptions) -> Result<(Figure, Vec<RegionId>), AppError> {
    if n == 0 {
        return Err(AppError::new(3, "Cannot build a row layout for zero parameters."));
    }
    let options = GridOptions { cbar: false, ..*options };
    let g = geometry(1, n, &options)?;
    let mut figure = Figure::new(options.figure_size.0, options.figure_size.1);
    let mut ids: Vec<RegionId> = Vec::with_capacity(n);

    for i in 0..n {
        let rect = Rect {
            left: g.pad_x,
            bottom: g.pad_y + (n - 1 - i) as f64 * (g.cell_h + g.gap_y),
            width: g.cell_w,
            height: g.cell_h,
        };
        let mut region = Region::new(RegionKind::Trace, rect);
        region.share_x = ids.first().copied();
        region.x_axis.labels = i == n - 1;
        ids.push(figure.add_region(region));
    }
    Ok((figure, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(n: usize, cbar: bool) -> GridOptions {
        GridOptions {
            cbar,
            ..GridOptions::for_count(n)
        }
    }

    #[test]
    fn grid_has_lower_triangle_only() {
        for n in 1..=5 {
            let (fig, grid) = make_axes_grid(n, &opts(n, true)).unwrap();
            assert_eq!(grid.populated(), n * (n + 1) / 2, "n={n}");
            assert_eq!(fig.count_kind(RegionKind::Diagonal), n);
            assert_eq!(fig.count_kind(RegionKind::OffDiagonal), n * (n - 1) / 2);
            for i in 0..n {
                for j in 0..n {
                    assert_eq!(grid.get(i, j).is_some(), j <= i, "cell ({i},{j})");
                }
            }
        }
    }

    #[test]
    fn tick_visibility_and_sides() {
        for n in 1..=5 {
            let (fig, grid) = make_axes_grid(n, &opts(n, true)).unwrap();
            for i in 0..n {
                for j in 0..=i {
                    let region = fig.region(grid.get(i, j).unwrap());
                    assert_eq!(region.x_axis.labels_shown(), i == n - 1, "x labels ({i},{j})");
                    assert_eq!(region.y_axis.labels_shown(), j == 0, "y labels ({i},{j})");
                    if i == j {
                        assert_eq!(region.y_axis.side, TickSide::Right);
                    } else {
                        assert_eq!(region.y_axis.side, TickSide::Left);
                    }
                }
            }
        }
    }

    #[test]
    fn axis_sharing_follows_columns_and_rows() {
        let n = 4;
        let (fig, grid) = make_axes_grid(n, &opts(n, true)).unwrap();
        for (i, j) in grid.lower_pairs() {
            let region = fig.region(grid.get(i, j).unwrap());
            assert_eq!(region.share_x, Some(grid.diagonal(j)));
            if j == i - 1 {
                assert_eq!(region.share_y, None);
            } else {
                assert_eq!(region.share_y, grid.get(i, i - 1));
            }
        }
        for i in 0..n {
            let diag = fig.region(grid.diagonal(i));
            assert_eq!(diag.share_x, None);
            assert_eq!(diag.share_y, None);
        }
    }

    #[test]
    fn colorbar_is_optional_and_right_of_grid() {
        let (fig, grid) = make_axes_grid(3, &opts(3, true)).unwrap();
        let cbar = fig.region(grid.colorbar.unwrap());
        let rightmost = fig.region(grid.get(2, 2).unwrap());
        assert!(cbar.rect.left > rightmost.rect.right());
        assert!(cbar.rect.right() <= 1.0);

        let (fig, grid) = make_axes_grid(3, &opts(3, false)).unwrap();
        assert!(grid.colorbar.is_none());
        assert_eq!(fig.count_kind(RegionKind::Colorbar), 0);
    }

    #[test]
    fn single_parameter_grid() {
        let (fig, grid) = make_axes_grid(1, &opts(1, true)).unwrap();
        assert_eq!(grid.populated(), 1);
        assert!(grid.lower_pairs().is_empty());
        assert_eq!(fig.len(), 2);
    }

    #[test]
    fn regions_tile_without_overlap() {
        let n = 3;
        let (fig, grid) = make_axes_grid(n, &opts(n, true)).unwrap();
        let a = fig.region(grid.get(2, 0).unwrap()).rect;
        let b = fig.region(grid.get(2, 1).unwrap()).rect;
        let c = fig.region(grid.get(1, 0).unwrap()).rect;
        assert!(a.right() <= b.left + 1e-12);
        assert!(a.top() <= c.bottom + 1e-12);
        assert!((a.width - b.width).abs() < 1e-12);
    }

    #[test]
    fn zero_parameters_is_an_error() {
        assert!(make_axes_grid(0, &GridOptions::default()).is_err());
        assert!(make_row_layout(0, &GridOptions::default()).is_err());
    }

    #[test]
    fn row_layout_shares_x_and_labels_bottom_only() {
        let (fig, ids) = make_row_layout(3, &GridOptions::for_count(3)).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(fig.region(ids[0]).share_x, None);
        assert_eq!(fig.region(ids[2]).share_x, Some(ids[0]));
        assert!(!fig.region(ids[0]).x_axis.labels_shown());
        assert!(fig.region(ids[2]).x_axis.labels_shown());
        assert!(fig.region(ids[0]).rect.bottom > fig.region(ids[2]).rect.bottom);
    }
}
