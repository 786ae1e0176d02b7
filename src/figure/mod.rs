//! Render-independent figure description.
//!
//! Generators build a [`Figure`]: a list of regions placed at normalized figure
//! coordinates, each holding drawing primitives and axis settings. Nothing is
//! drawn until [`render::save_svg`] (or [`render::render_svg_string`]) is
//! called, which keeps layout and data preparation testable without a backend.

pub mod colormap;
pub mod render;

pub use colormap::{BandNorm, Palette, Rgb};

/// Handle to a region inside a [`Figure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub usize);

/// Rectangle in figure fractions, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// 1D profile or marginal histogram on the diagonal of a triangle grid.
    Diagonal,
    /// 2D map below the diagonal.
    OffDiagonal,
    /// One row of a stacked trace layout.
    Trace,
    Colorbar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSide {
    Left,
    Right,
    Bottom,
}

/// Tick placement and visibility for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisStyle {
    pub side: TickSide,
    /// Whether ticks are drawn at all.
    pub ticks: bool,
    /// Whether tick labels are drawn.
    pub labels: bool,
    /// Upper bound on the number of tick labels.
    pub max_labels: usize,
}

impl AxisStyle {
    pub fn new(side: TickSide) -> Self {
        Self {
            side,
            ticks: true,
            labels: true,
            max_labels: 5,
        }
    }

    /// No ticks and no labels.
    pub fn hide(&mut self) {
        self.ticks = false;
        self.labels = false;
    }

    pub fn labels_shown(&self) -> bool {
        self.ticks && self.labels
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Rgb,
    pub alpha: f64,
    pub width: u32,
    pub dashed: bool,
}

impl LineStyle {
    pub fn solid(color: Rgb) -> Self {
        Self {
            color,
            alpha: 1.0,
            width: 1,
            dashed: false,
        }
    }

    pub fn dashed(color: Rgb) -> Self {
        Self {
            dashed: true,
            ..Self::solid(color)
        }
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }
}

/// Filled contour over a rectilinear grid; `z[iy][ix]` sits at `(x[ix], y[iy])`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledContour {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<f64>>,
    pub norm: BandNorm,
}

/// Discrete colorbar; one label per band, listed bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub norm: BandNorm,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line { points: Vec<(f64, f64)>, style: LineStyle },
    VLine { x: f64, style: LineStyle },
    HLine { y: f64, style: LineStyle },
    StepHistogram { edges: Vec<f64>, counts: Vec<f64>, style: LineStyle },
    FilledContour(FilledContour),
    Colorbar(Colorbar),
}

impl Primitive {
    /// Data extent along x, if the primitive contributes one.
    fn x_extent(&self) -> Option<(f64, f64)> {
        match self {
            Primitive::Line { points, .. } => extent(points.iter().map(|p| p.0)),
            Primitive::VLine { x, .. } => extent(std::iter::once(*x)),
            Primitive::StepHistogram { edges, .. } => extent(edges.iter().copied()),
            Primitive::FilledContour(c) => extent(c.x.iter().copied()),
            Primitive::HLine { .. } | Primitive::Colorbar(_) => None,
        }
    }

    fn y_extent(&self) -> Option<(f64, f64)> {
        match self {
            Primitive::Line { points, .. } => extent(points.iter().map(|p| p.1)),
            Primitive::HLine { y, .. } => extent(std::iter::once(*y)),
            Primitive::StepHistogram { counts, .. } => {
                extent(counts.iter().copied().chain(std::iter::once(0.0)))
            }
            Primitive::FilledContour(c) => extent(c.y.iter().copied()),
            Primitive::VLine { .. } | Primitive::Colorbar(_) => None,
        }
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo <= hi).then_some((lo, hi))
}

fn merge(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.max(b.1))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Widen zero-width ranges so they can be used as axis bounds.
fn non_degenerate((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        return (lo, hi);
    }
    let pad = if lo != 0.0 { 0.05 * lo.abs() } else { 0.5 };
    (lo - pad, hi + pad)
}

/// One axes-like area of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub kind: RegionKind,
    pub rect: Rect,
    pub share_x: Option<RegionId>,
    pub share_y: Option<RegionId>,
    pub x_axis: AxisStyle,
    pub y_axis: AxisStyle,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub primitives: Vec<Primitive>,
}

impl Region {
    pub fn new(kind: RegionKind, rect: Rect) -> Self {
        Self {
            kind,
            rect,
            share_x: None,
            share_y: None,
            x_axis: AxisStyle::new(TickSide::Bottom),
            y_axis: AxisStyle::new(TickSide::Left),
            title: None,
            x_label: None,
            y_label: None,
            x_range: None,
            y_range: None,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn has_contour(&self) -> bool {
        self.primitives
            .iter()
            .any(|p| matches!(p, Primitive::FilledContour(_)))
    }
}

/// A figure: physical size plus an ordered list of regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    regions: Vec<Region>,
}

impl Figure {
    pub fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
            dpi: 100,
            regions: Vec::new(),
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.width_in * self.dpi as f64).round().max(1.0) as u32;
        let h = (self.height_in * self.dpi as f64).round().max(1.0) as u32;
        (w, h)
    }

    pub fn add_region(&mut self, region: Region) -> RegionId {
        self.regions.push(region);
        RegionId(self.regions.len() - 1)
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.0]
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut Region {
        &mut self.regions[id.0]
    }

    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions.iter().enumerate().map(|(i, r)| (RegionId(i), r))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn count_kind(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind == kind).count()
    }

    /// Effective x range: explicit range, then the shared axis, then the data.
    pub fn x_range(&self, id: RegionId) -> (f64, f64) {
        self.resolve(id, |r| r.x_range, |r| r.share_x, Primitive::x_extent)
    }

    /// Effective y range: explicit range, then the shared axis, then the data.
    pub fn y_range(&self, id: RegionId) -> (f64, f64) {
        self.resolve(id, |r| r.y_range, |r| r.share_y, Primitive::y_extent)
    }

    fn resolve(
        &self,
        id: RegionId,
        explicit: impl Fn(&Region) -> Option<(f64, f64)>,
        share: impl Fn(&Region) -> Option<RegionId>,
        extent_of: impl Fn(&Primitive) -> Option<(f64, f64)>,
    ) -> (f64, f64) {
        // Follow the sharing chain to its root; all members use the root's
        // explicit range, or the union of their data extents.
        let mut root = id;
        for _ in 0..self.regions.len() {
            let region = self.region(root);
            if explicit(region).is_some() {
                break;
            }
            match share(region) {
                Some(next) if next != root => root = next,
                _ => break,
            }
        }
        if let Some(range) = explicit(self.region(root)) {
            return non_degenerate(range);
        }

        let members = self
            .regions()
            .filter(|(rid, r)| *rid == root || share(*r) == Some(root))
            .map(|(_, r)| r);
        let mut data = None;
        for region in members {
            for p in &region.primitives {
                data = merge(data, extent_of(p));
            }
        }
        non_degenerate(data.unwrap_or((0.0, 1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect {
            left: 0.0,
            bottom: 0.0,
            width: 0.5,
            height: 0.5,
        }
    }

    #[test]
    fn shared_axes_follow_the_root() {
        let mut fig = Figure::new(4.0, 4.0);
        let root = fig.add_region(Region::new(RegionKind::Diagonal, rect()));
        fig.region_mut(root).x_range = Some((1.0, 3.0));

        let mut child = Region::new(RegionKind::OffDiagonal, rect());
        child.share_x = Some(root);
        let child = fig.add_region(child);

        assert_eq!(fig.x_range(child), (1.0, 3.0));
    }

    #[test]
    fn data_extent_is_used_without_explicit_range() {
        let mut fig = Figure::new(4.0, 4.0);
        let id = fig.add_region(Region::new(RegionKind::Trace, rect()));
        fig.region_mut(id).push(Primitive::Line {
            points: vec![(0.0, -2.0), (10.0, 4.0)],
            style: LineStyle::solid(Rgb::BLACK),
        });
        fig.region_mut(id).push(Primitive::HLine {
            y: 6.0,
            style: LineStyle::solid(Rgb::BLACK),
        });
        assert_eq!(fig.x_range(id), (0.0, 10.0));
        assert_eq!(fig.y_range(id), (-2.0, 6.0));
    }

    #[test]
    fn degenerate_ranges_are_widened() {
        let mut fig = Figure::new(4.0, 4.0);
        let id = fig.add_region(Region::new(RegionKind::Trace, rect()));
        fig.region_mut(id).x_range = Some((2.0, 2.0));
        let (lo, hi) = fig.x_range(id);
        assert!(lo < 2.0 && hi > 2.0);
        assert_eq!(fig.y_range(id), (0.0, 1.0));
    }
}
