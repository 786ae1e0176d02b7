//! Posterior correlation (corner) plots from a stored sample chain.
//!
//! Diagonal: marginal step histogram with the 15.87/50/84.13 percentiles.
//! Below the diagonal: 2D histogram of the pair, min-max normalized and
//! banded at the highest-density-region thresholds for 1σ/2σ/3σ mass.

use tracing::{debug, info, warn};

use crate::chain::ChainReader;
use crate::domain::{CredibleInterval, LabelStyle, Selection};
use crate::error::AppError;
use crate::figure::{
    BandNorm, Colorbar, Figure, FilledContour, LineStyle, Palette, Primitive, RegionId, Rgb,
};
use crate::layout::{AxesGrid, GridOptions, make_axes_grid};
use crate::math::{
    CREDIBLE_PERCENTILES, Histogram1d, Histogram2d, bin_range, density_bounds, min_max,
    percentiles, resolve_bin_count,
};
use crate::plots::labels::{display_labels, interval_title, select_by_filter};
use crate::plots::profile::SIGMA_LABELS;
use crate::progress::work_bar;

/// Histogram bin request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BinSpec {
    /// Scott's rule per parameter.
    #[default]
    Auto,
    /// Same count for every parameter.
    All(usize),
    /// One entry per selected parameter; missing entries use Scott's rule.
    PerParameter(Vec<Option<usize>>),
}

impl BinSpec {
    pub fn for_index(&self, i: usize) -> Option<usize> {
        match self {
            BinSpec::Auto => None,
            BinSpec::All(n) => Some(*n),
            BinSpec::PerParameter(v) => v.get(i).copied().flatten(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationOptions {
    /// Substrings matched against display labels; `None` selects all.
    pub filter: Option<Vec<String>>,
    pub bins: BinSpec,
    pub selection: Selection,
    pub labels: LabelStyle,
    pub progress: bool,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            filter: None,
            bins: BinSpec::Auto,
            selection: Selection::default(),
            labels: LabelStyle::default(),
            progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationPlot {
    pub figure: Figure,
    pub grid: AxesGrid,
    pub colorbar: Option<RegionId>,
    pub intervals: Vec<CredibleInterval>,
}

/// Colorbar norm whose three bands reuse the contour band colors.
pub(crate) fn sigma_legend() -> Result<BandNorm, AppError> {
    BandNorm::new(vec![0.0, 1.0, 2.0, 3.0], Palette::sigma())
}

struct Marginal {
    samples: Vec<f64>,
    bins: usize,
    min: f64,
    max: f64,
}

pub fn generate_correlation_plot<R: ChainReader + ?Sized>(
    reader: &R,
    options: &CorrelationOptions,
) -> Result<CorrelationPlot, AppError> {
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
    debug!(first = steps.start, last = steps.end, "chain selection");

    let display = display_labels(&labels, options.labels);
    let selected = select_by_filter(&display, options.filter.as_deref());
    let n = selected.len();
    if n == 0 {
        return Err(AppError::new(3, "No chain parameters match the filter."));
    }

    let grid_options = GridOptions {
        axis_padding_cm: 0.0,
        ..GridOptions::for_count(n)
    };
    let (mut figure, grid) = make_axes_grid(n, &grid_options)?;
    let n_pairs = n * (n - 1) / 2;
    let bar = work_bar((n + n_pairs) as u64, options.progress);
    let accent = LineStyle::dashed(Rgb::ACCENT);

    let mut marginals: Vec<Marginal> = Vec::with_capacity(n);
    let mut intervals = Vec::with_capacity(n);
    for (i, &k) in selected.iter().enumerate() {
        let name = &display[k];
        bar.set_message(name.clone());
        let samples = chain.flattened(steps.clone(), k);
        let (min, max) = min_max(&samples)
            .ok_or_else(|| AppError::numeric(format!("Samples of '{name}' are not finite.")))?;
        let bins = resolve_bin_count(&samples, options.bins.for_index(i));
        let q = percentiles(&samples, &CREDIBLE_PERCENTILES)?;
        let (q16, q50, q84) = (q[0], q[1], q[2]);

        let hist = Histogram1d::new(&samples, bins, (min, max));
        let region = figure.region_mut(grid.diagonal(i));
        region.x_range = Some(bin_range(min, max));
        region.push(Primitive::StepHistogram {
            edges: hist.edges,
            counts: hist.counts,
            style: LineStyle::solid(Rgb::BLACK),
        });
        for x in [q16, q50, q84] {
            region.push(Primitive::VLine { x, style: accent });
        }
        region.y_axis.hide();

        let interval = CredibleInterval {
            label: name.clone(),
            q16,
            q50,
            q84,
            bins,
            min,
            max,
        };
        region.title = Some(interval_title(name, q50, interval.minus(), interval.plus()));
        intervals.push(interval);
        marginals.push(Marginal {
            samples,
            bins,
            min,
            max,
        });
        bar.inc(1);
    }

    let mut contour_produced = false;
    for (i, j) in grid.lower_pairs() {
        let (x, y) = (&marginals[j], &marginals[i]);
        let (x_name, y_name) = (&display[selected[j]], &display[selected[i]]);
        bar.set_message(format!("{x_name}, {y_name}"));

        let hist = Histogram2d::new(
            &x.samples,
            &y.samples,
            (x.bins, y.bins),
            (x.min, x.max),
            (y.min, y.max),
        );
        let density = hist.normalized_rows();
        let bounds = density_bounds(&density);

        let Some(id) = grid.get(i, j) else {
            continue;
        };
        let region = figure.region_mut(id);
        region.y_range = Some(bin_range(y.min, y.max));
        if j == 0 {
            region.y_label = Some(y_name.clone());
        }
        if i == n - 1 {
            region.x_label = Some(x_name.clone());
        }

        if bounds.len() >= 2 {
            let norm = BandNorm::new(bounds, Palette::sigma())?;
            region.push(Primitive::FilledContour(FilledContour {
                x: hist.x_centers(),
                y: hist.y_centers(),
                z: density,
                norm,
            }));
            contour_produced = true;
        } else {
            warn!(x = %x_name, y = %y_name, "density has a single level, no contour drawn");
        }
        bar.inc(1);
    }

    if contour_produced {
        if let Some(cbar) = grid.colorbar {
            figure.region_mut(cbar).push(Primitive::Colorbar(Colorbar {
                norm: sigma_legend()?,
                labels: SIGMA_LABELS.iter().map(|s| s.to_string()).collect(),
            }));
        }
    }

    bar.finish_and_clear();
    info!(params = n, samples = steps.len() * chain.walkers(), "correlation plot generated");

    Ok(CorrelationPlot {
        figure,
        colorbar: grid.colorbar,
        grid,
        intervals,
    })
}
