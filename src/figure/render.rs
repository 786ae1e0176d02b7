//! Plotters-powered SVG rendering of a [`Figure`].
//!
//! Each region is mapped to a sub-area of the root drawing area and rendered as
//! its own cartesian chart. Filled contours are drawn cell by cell, each cell
//! colored by its band; colorbars are drawn directly in pixel space.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::error::AppError;
use crate::figure::{
    Colorbar, Figure, FilledContour, LineStyle, Primitive, Region, RegionId, RegionKind, Rgb,
    TickSide,
};

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Label area reserved for tick labels plus an axis description (pixels).
const LABEL_AREA: u32 = 34;
/// Number of dashes drawn across a reference line.
const DASHES: usize = 24;

/// Render `figure` to an SVG file.
pub fn save_svg(figure: &Figure, path: &Path) -> Result<(), AppError> {
    let root = SVGBackend::new(path, figure.pixel_size()).into_drawing_area();
    draw_figure(figure, &root)
        .and_then(|_| root.present())
        .map_err(|e| AppError::numeric(format!("Failed to render '{}': {e}", path.display())))?;
    debug!(path = %path.display(), regions = figure.len(), "figure written");
    Ok(())
}

/// Render `figure` to an in-memory SVG document.
pub fn render_svg_string(figure: &Figure) -> Result<String, AppError> {
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, figure.pixel_size()).into_drawing_area();
        draw_figure(figure, &root)
            .and_then(|_| root.present())
            .map_err(|e| AppError::numeric(format!("Failed to render figure: {e}")))?;
    }
    Ok(out)
}

fn draw_figure<DB: DrawingBackend>(figure: &Figure, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    for (id, region) in figure.regions() {
        let area = region_area(root, region);
        match region.kind {
            RegionKind::Colorbar => {
                for p in &region.primitives {
                    if let Primitive::Colorbar(bar) = p {
                        draw_colorbar(&area, bar)?;
                    }
                }
            }
            _ => draw_chart(figure, id, region, &area)?,
        }
    }
    Ok(())
}

fn region_area<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, region: &Region) -> DrawingArea<DB, Shift> {
    let (w, h) = root.dim_in_pixel();
    let (w, h) = (w as f64, h as f64);
    let left = (region.rect.left * w).round() as i32;
    let top = ((1.0 - region.rect.top()) * h).round() as i32;
    let width = (region.rect.width * w).round().max(1.0) as u32;
    let height = (region.rect.height * h).round().max(1.0) as u32;
    root.clone().shrink((left, top), (width, height))
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn shape(style: &LineStyle) -> ShapeStyle {
    color(style.color).mix(style.alpha).stroke_width(style.width)
}

fn draw_chart<DB: DrawingBackend>(
    figure: &Figure,
    id: RegionId,
    region: &Region,
    area: &DrawingArea<DB, Shift>,
) -> DrawResult<DB> {
    let (x_lo, x_hi) = figure.x_range(id);
    let (y_lo, y_hi) = figure.y_range(id);

    let mut builder = ChartBuilder::on(area);
    builder.margin(2);
    if let Some(title) = &region.title {
        builder.caption(title, ("sans-serif", 11).into_font());
    }
    let show_x = region.x_axis.labels_shown() || region.x_label.is_some();
    let show_y = region.y_axis.labels_shown() || region.y_label.is_some();
    if show_x {
        builder.x_label_area_size(LABEL_AREA);
    }
    if show_y {
        match region.y_axis.side {
            TickSide::Right => builder.right_y_label_area_size(LABEL_AREA),
            TickSide::Left | TickSide::Bottom => builder.y_label_area_size(LABEL_AREA),
        };
    }
    let mut chart = builder.build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    {
        let fmt = |v: &f64| format_tick(*v);
        let blank = |_: &f64| String::new();

        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .disable_y_mesh()
            .axis_style(&BLACK)
            .label_style(("sans-serif", 10).into_font())
            .x_labels(region.x_axis.max_labels)
            .y_labels(region.y_axis.max_labels);
        if region.x_axis.labels_shown() {
            mesh.x_label_formatter(&fmt);
        } else {
            mesh.x_label_formatter(&blank);
        }
        if region.y_axis.labels_shown() {
            mesh.y_label_formatter(&fmt);
        } else {
            mesh.y_label_formatter(&blank);
        }
        if let Some(label) = &region.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &region.y_label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;
    }

    for primitive in &region.primitives {
        match primitive {
            Primitive::Line { points, style } => {
                if style.dashed {
                    chart.draw_series(
                        dashed_polyline(points)
                            .into_iter()
                            .map(|seg| PathElement::new(seg, shape(style))),
                    )?;
                } else {
                    chart.draw_series(LineSeries::new(points.iter().copied(), shape(style)))?;
                }
            }
            Primitive::VLine { x, style } => {
                let segment = vec![(*x, y_lo), (*x, y_hi)];
                draw_reference(&mut chart, segment, style)?;
            }
            Primitive::HLine { y, style } => {
                let segment = vec![(x_lo, *y), (x_hi, *y)];
                draw_reference(&mut chart, segment, style)?;
            }
            Primitive::StepHistogram { edges, counts, style } => {
                chart.draw_series(LineSeries::new(step_path(edges, counts), shape(style)))?;
            }
            Primitive::FilledContour(contour) => {
                chart.draw_series(contour_cells(contour, (x_lo, x_hi), (y_lo, y_hi)))?;
            }
            // Colorbars only live in colorbar regions.
            Primitive::Colorbar(_) => {}
        }
    }
    Ok(())
}

fn draw_reference<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>,
    segment: Vec<(f64, f64)>,
    style: &LineStyle,
) -> DrawResult<DB> {
    if style.dashed {
        chart.draw_series(
            dashed_polyline(&segment)
                .into_iter()
                .map(|seg| PathElement::new(seg, shape(style))),
        )?;
    } else {
        chart.draw_series(std::iter::once(PathElement::new(segment, shape(style))))?;
    }
    Ok(())
}

/// Split a polyline into dash segments (data space, per edge).
fn dashed_polyline(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    for edge in points.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        for k in (0..DASHES).step_by(2) {
            let t0 = k as f64 / DASHES as f64;
            let t1 = (k + 1) as f64 / DASHES as f64;
            out.push(vec![
                (a.0 + (b.0 - a.0) * t0, a.1 + (b.1 - a.1) * t0),
                (a.0 + (b.0 - a.0) * t1, a.1 + (b.1 - a.1) * t1),
            ]);
        }
    }
    out
}

/// Outline of a step histogram, closed down to zero at both ends.
fn step_path(edges: &[f64], counts: &[f64]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(2 * counts.len() + 2);
    if edges.len() != counts.len() + 1 {
        return out;
    }
    out.push((edges[0], 0.0));
    for (i, &c) in counts.iter().enumerate() {
        out.push((edges[i], c));
        out.push((edges[i + 1], c));
    }
    out.push((edges[edges.len() - 1], 0.0));
    out
}

/// Cell boundaries around grid coordinates (midpoints, half-steps at the ends).
fn cell_edges(coords: &[f64]) -> Vec<f64> {
    match coords.len() {
        0 => Vec::new(),
        1 => vec![coords[0] - 0.5, coords[0] + 0.5],
        n => {
            let mut out = Vec::with_capacity(n + 1);
            out.push(coords[0] - 0.5 * (coords[1] - coords[0]));
            for w in coords.windows(2) {
                out.push(0.5 * (w[0] + w[1]));
            }
            out.push(coords[n - 1] + 0.5 * (coords[n - 1] - coords[n - 2]));
            out
        }
    }
}

/// Clamp cell edges into `[lo, hi]`; outer cells would otherwise reach into the margins.
fn clamp_edges(edges: Vec<f64>, (lo, hi): (f64, f64)) -> Vec<f64> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    edges.into_iter().map(|e| e.clamp(lo, hi)).collect()
}

fn contour_cells(
    contour: &FilledContour,
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> Vec<Rectangle<(f64, f64)>> {
    let xe = clamp_edges(cell_edges(&contour.x), x_range);
    let ye = clamp_edges(cell_edges(&contour.y), y_range);
    let mut out = Vec::new();
    for (iy, row) in contour.z.iter().enumerate().take(contour.y.len()) {
        for (ix, &z) in row.iter().enumerate().take(contour.x.len()) {
            let Some(rgb) = contour.norm.color_for(z) else {
                continue;
            };
            out.push(Rectangle::new(
                [(xe[ix], ye[iy]), (xe[ix + 1], ye[iy + 1])],
                color(rgb).filled(),
            ));
        }
    }
    out
}

fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, bar: &Colorbar) -> DrawResult<DB> {
    let (w, h) = area.dim_in_pixel();
    let n = bar.norm.n_bands().max(1) as i32;
    let bar_width = (w as i32 * 2 / 5).max(4);
    let band_height = h as i32 / n;
    let font = ("sans-serif", 10).into_font();
    let text = TextStyle::from(font).color(&BLACK);

    for band in 0..n {
        // Bands are listed bottom to top.
        let bottom = h as i32 - band * band_height;
        let top = bottom - band_height;
        let rgb = bar.norm.band_color(band as usize);
        area.draw(&Rectangle::new([(0, top), (bar_width, bottom)], color(rgb).filled()))?;
        area.draw(&Rectangle::new([(0, top), (bar_width, bottom)], BLACK.stroke_width(1)))?;
        if let Some(label) = bar.labels.get(band as usize) {
            area.draw_text(label, &text, (bar_width + 4, (top + bottom) / 2 - 5))?;
        }
    }
    Ok(())
}

/// Compact tick label: plain decimals for moderate magnitudes, exponent otherwise.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e4).contains(&a) {
        format!("{v:.2e}")
    } else {
        let s = format!("{v:.3}");
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" { "0".to_string() } else { s.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{BandNorm, Palette, Rect};

    #[test]
    fn step_path_closes_to_zero() {
        let path = step_path(&[0.0, 1.0, 2.0], &[3.0, 5.0]);
        assert_eq!(path.first(), Some(&(0.0, 0.0)));
        assert_eq!(path.last(), Some(&(2.0, 0.0)));
        assert!(path.contains(&(1.0, 5.0)));
        assert!(step_path(&[0.0], &[1.0]).is_empty());
    }

    #[test]
    fn cell_edges_bracket_coordinates() {
        assert_eq!(cell_edges(&[0.0, 1.0, 2.0]), vec![-0.5, 0.5, 1.5, 2.5]);
        assert_eq!(cell_edges(&[3.0]), vec![2.5, 3.5]);
    }

    #[test]
    fn contour_cells_stay_inside_the_axes() {
        let norm = BandNorm::new(vec![-9.0, -4.0, -1.0, 0.0], Palette::sigma()).unwrap();
        let contour = FilledContour {
            x: vec![0.0, 1.0, 2.0],
            y: vec![10.0, 20.0],
            z: vec![vec![-0.5; 3], vec![-2.0; 3]],
            norm,
        };
        let cells = contour_cells(&contour, (0.0, 2.0), (10.0, 20.0));
        assert_eq!(cells.len(), 6);
        assert_eq!(clamp_edges(cell_edges(&contour.x), (0.0, 2.0)), vec![0.0, 0.5, 1.5, 2.0]);
        assert_eq!(clamp_edges(cell_edges(&contour.y), (20.0, 10.0)), vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(1.5), "1.5");
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(12345.0), "1.23e4");
    }

    #[test]
    fn renders_contour_and_colorbar_to_svg() {
        let mut fig = Figure::new(3.0, 3.0);
        let norm = BandNorm::new(vec![-9.0, -4.0, -1.0, 0.0], Palette::sigma()).unwrap();
        let map = fig.add_region(Region::new(
            RegionKind::OffDiagonal,
            Rect { left: 0.1, bottom: 0.1, width: 0.6, height: 0.8 },
        ));
        fig.region_mut(map).push(Primitive::FilledContour(FilledContour {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            z: vec![vec![-0.5, -2.0], vec![-5.0, -12.0]],
            norm: norm.clone(),
        }));
        fig.region_mut(map).push(Primitive::VLine {
            x: 0.5,
            style: LineStyle::dashed(Rgb::ACCENT),
        });
        let bar = fig.add_region(Region::new(
            RegionKind::Colorbar,
            Rect { left: 0.8, bottom: 0.1, width: 0.15, height: 0.8 },
        ));
        fig.region_mut(bar).push(Primitive::Colorbar(Colorbar {
            norm,
            labels: vec!["3σ".into(), "2σ".into(), "1σ".into()],
        }));

        let svg = render_svg_string(&fig).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("1σ"));
    }
}
