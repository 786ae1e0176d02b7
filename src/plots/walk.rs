//! Walker trace plots: raw per-step trajectories of the selected parameters.

use tracing::info;

use crate::chain::ChainReader;
use crate::domain::{LabelStyle, Selection};
use crate::error::AppError;
use crate::figure::{Figure, LineStyle, Primitive, RegionId, Rgb};
use crate::layout::{GridOptions, make_row_layout};
use crate::math::median;
use crate::plots::labels::{display_labels, select_by_filter};
use crate::progress::work_bar;

#[derive(Debug, Clone, PartialEq)]
pub struct WalkOptions {
    /// Substrings matched against display labels; `None` selects all.
    pub filter: Option<Vec<String>>,
    pub selection: Selection,
    /// Draw at most this many walkers per parameter; `None` draws all.
    pub max_walkers: Option<usize>,
    pub labels: LabelStyle,
    pub progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            filter: None,
            selection: Selection::default(),
            max_walkers: None,
            labels: LabelStyle::default(),
            progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkPlot {
    pub figure: Figure,
    pub regions: Vec<RegionId>,
    /// Display labels of the plotted parameters, top to bottom.
    pub labels: Vec<String>,
    /// Median of all samples in the window, per plotted parameter.
    pub medians: Vec<f64>,
}

pub fn generate_walk_plot<R: ChainReader + ?Sized>(
    reader: &R,
    options: &WalkOptions,
) -> Result<WalkPlot, AppError> {
    let labels = reader.labels()?;
    let chain = reader.chain()?;
    if labels.len() != chain.n_params() {
        return Err(AppError::input(format!(
            "Chain has {} parameters but {} labels.",
            chain.n_params(),
            labels.len()
        )));
    }
    let steps = options.selection.step_range(chain.steps())?;
    let display = display_labels(&labels, options.labels);
    let selected = select_by_filter(&display, options.filter.as_deref());
    if selected.is_empty() {
        return Err(AppError::new(3, "No chain parameters match the filter."));
    }

    let (mut figure, regions) = make_row_layout(selected.len(), &GridOptions::for_count(selected.len()))?;
    let walkers = options
        .max_walkers
        .map_or(chain.walkers(), |m| m.min(chain.walkers()));
    let bar = work_bar(selected.len() as u64, options.progress);
    let trace_style = LineStyle::solid(Rgb::GRAY).with_alpha(0.3);

    let mut medians = Vec::with_capacity(selected.len());
    for (&k, &id) in selected.iter().zip(&regions) {
        bar.set_message(display[k].clone());
        let med = median(&chain.flattened(steps.clone(), k))?;

        let region = figure.region_mut(id);
        for w in 0..walkers {
            let trace = chain.walker_trace(steps.clone(), w, k);
            region.push(Primitive::Line {
                points: steps
                    .clone()
                    .zip(trace)
                    .map(|(s, v)| (s as f64, v))
                    .collect(),
                style: trace_style,
            });
        }
        region.push(Primitive::HLine {
            y: med,
            style: LineStyle::solid(Rgb::BLACK),
        });
        region.y_label = Some(display[k].clone());
        medians.push(med);
        bar.inc(1);
    }
    if let Some(&last) = regions.last() {
        figure.region_mut(last).x_label = Some("Step".to_string());
    }

    bar.finish_and_clear();
    info!(params = selected.len(), walkers, "walk plot generated");

    Ok(WalkPlot {
        figure,
        regions,
        labels: selected.iter().map(|&k| display[k].clone()).collect(),
        medians,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainArray, InMemoryChain};
    use ndarray::Array3;

    fn ramp_chain() -> InMemoryChain {
        // a = step, b = -walker
        let data = Array3::from_shape_fn((40, 5, 2), |(s, w, p)| if p == 0 { s as f64 } else { -(w as f64) });
        InMemoryChain::new(
            vec!["src___m___a".into(), "src___m___b".into()],
            ChainArray::new(data).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn one_region_per_parameter_with_walker_lines() {
        let plot = generate_walk_plot(&ramp_chain(), &WalkOptions::default()).unwrap();
        assert_eq!(plot.regions.len(), 2);
        let top = plot.figure.region(plot.regions[0]);
        let lines = top
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count();
        assert_eq!(lines, 5);
        assert_eq!(top.y_label.as_deref(), Some("m a"));
        let bottom = plot.figure.region(plot.regions[1]);
        assert_eq!(bottom.x_label.as_deref(), Some("Step"));
        assert_eq!(bottom.share_x, Some(plot.regions[0]));
    }

    #[test]
    fn medians_and_step_axis_follow_the_selection() {
        let opts = WalkOptions {
            selection: Selection::new(50.0, 100.0).unwrap(),
            max_walkers: Some(2),
            ..WalkOptions::default()
        };
        let plot = generate_walk_plot(&ramp_chain(), &opts).unwrap();
        // Steps 20..40, median 29.5.
        assert!((plot.medians[0] - 29.5).abs() < 1e-12);
        assert!((plot.medians[1] + 2.0).abs() < 1e-12);

        let top = plot.figure.region(plot.regions[0]);
        let Some(Primitive::Line { points, style }) = top.primitives.first() else {
            panic!("expected a walker line");
        };
        assert_eq!(points.first().unwrap().0, 20.0);
        assert_eq!(points.last().unwrap().0, 39.0);
        assert!((style.alpha - 0.3).abs() < 1e-12);
        let lines = top
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count();
        assert_eq!(lines, 2);
        assert!(matches!(top.primitives.last(), Some(Primitive::HLine { .. })));
    }

    #[test]
    fn filter_selects_rows() {
        let opts = WalkOptions {
            filter: Some(vec!["m b".into()]),
            ..WalkOptions::default()
        };
        let plot = generate_walk_plot(&ramp_chain(), &opts).unwrap();
        assert_eq!(plot.labels, vec!["m b"]);
    }
}
