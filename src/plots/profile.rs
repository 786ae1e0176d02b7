//! Chi-square / likelihood profile maps.
//!
//! Diagonal: deviance as a function of one pinned parameter, all others
//! refitted. Below the diagonal: deviance over a grid of two pinned
//! parameters, shown as 1σ/2σ/3σ confidence bands.
//!
//! The engine is borrowed mutably for the whole run and restored to its
//! baseline after every sweep; a [`SweepGuard`] makes sure that also happens
//! when a refit fails halfway.

use tracing::{debug, info};

use crate::domain::{DevianceKind, FitSnapshot, LabelStyle, SweptRange};
use crate::error::AppError;
use crate::figure::{
    BandNorm, Colorbar, Figure, FilledContour, LineStyle, Palette, Primitive, RegionId, Rgb,
};
use crate::fit::{FitEngine, FitOptions, SweepGuard};
use crate::layout::{AxesGrid, GridOptions, make_axes_grid};
use crate::math::{deviance_bounds, sigma_thresholds};
use crate::plots::labels::interval_title;
use crate::progress::work_bar;

/// Colorbar labels for deviance bands, bottom to top.
pub const SIGMA_LABELS: [&str; 3] = ["3σ", "2σ", "1σ"];

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileOptions {
    /// Substrings selecting parameters by full label; `None` selects all.
    pub filter: Option<Vec<String>>,
    pub method: DevianceKind,
    pub resolution_diag: usize,
    pub resolution_map: usize,
    pub fit: FitOptions,
    pub labels: LabelStyle,
    /// Degrees of freedom used for the 2D confidence bands.
    pub contour_dof: u32,
    pub progress: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            filter: None,
            method: DevianceKind::ChiSquare,
            resolution_diag: 15,
            resolution_map: 15,
            fit: FitOptions::default(),
            labels: LabelStyle::default(),
            contour_dof: 1,
            progress: false,
        }
    }
}

/// Deviance along one pinned parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCurve {
    pub label: String,
    pub range: SweptRange,
    pub values: Vec<f64>,
    pub deviance: Vec<f64>,
}

/// Deviance over a grid of two pinned parameters; `deviance[iy][ix]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DevianceMap {
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub deviance: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct ChisquareMap {
    pub figure: Figure,
    pub grid: AxesGrid,
    pub colorbar: Option<RegionId>,
    pub baseline: FitSnapshot,
    pub profiles: Vec<ProfileCurve>,
    pub maps: Vec<DevianceMap>,
}

/// Deviance of the engine's current fit relative to `baseline`.
///
/// Log-likelihood differences are used when both sides report one, chi-square
/// differences otherwise. The flag tells which one was used.
fn deviance<E: FitEngine + ?Sized>(engine: &E, baseline: &FitSnapshot) -> Result<(f64, bool), AppError> {
    if let (Some(llh), Some(base)) = (engine.llh_result(), baseline.summary.llh) {
        return Ok((llh - base, true));
    }
    match (engine.chisqr(), baseline.summary.chisqr) {
        (Some(chi), Some(base)) => Ok((chi - base, false)),
        _ => Err(AppError::numeric("Fit engine reported no chi-square.")),
    }
}

/// Pin the given parameters on a copy of the baseline, refit, and return the
/// deviance.
fn refit_pinned<E: FitEngine + ?Sized>(
    engine: &mut E,
    baseline: &FitSnapshot,
    pins: &[(&str, f64)],
    options: &FitOptions,
) -> Result<(f64, bool), AppError> {
    let mut params = baseline.params.clone();
    for &(label, value) in pins {
        params.pin(label, value)?;
    }
    engine.apply_params(params)?;
    engine.fit(false, options)?;
    deviance(engine, baseline)
}

pub fn generate_chisquare_map<E: FitEngine + ?Sized>(
    engine: &mut E,
    options: &ProfileOptions,
) -> Result<ChisquareMap, AppError> {
    if options.resolution_diag < 2 || options.resolution_map < 2 {
        return Err(AppError::input("Profile resolutions must be at least 2."));
    }
    let mut fit_options = options.fit;
    if options.method == DevianceKind::LogLikelihood {
        fit_options.llh_selected = true;
    }

    if engine.chisqr().is_none() {
        info!("no prior fit result, fitting before profiling");
        engine.fit(true, &fit_options)?;
    } else if fit_options.llh_selected && engine.llh_result().is_none() {
        debug!("baseline has no likelihood, refitting once");
        engine.fit(false, &fit_options)?;
    }

    let mut guard = SweepGuard::new(engine);
    let baseline = guard.baseline().clone();

    let selected: Vec<(String, String, SweptRange)> = baseline
        .params
        .iter()
        .filter(|p| p.vary)
        .filter(|p| {
            let label = p.name.label();
            options
                .filter
                .as_ref()
                .is_none_or(|f| f.iter().any(|s| label.contains(s.as_str())))
        })
        .map(|p| (p.name.label(), p.name.display(options.labels), p.swept_range()))
        .collect();
    let n = selected.len();
    if n == 0 {
        return Err(AppError::new(3, "No varied parameters match the filter."));
    }

    let grid_options = GridOptions {
        axis_padding_cm: 0.0,
        cbar: n > 1,
        ..GridOptions::for_count(n)
    };
    let (mut figure, grid) = make_axes_grid(n, &grid_options)?;

    let rd = options.resolution_diag;
    let rm = options.resolution_map;
    let n_pairs = n * (n - 1) / 2;
    let bar = work_bar((n * rd + n_pairs * rm * rm) as u64, options.progress);

    let [t1, _, _] = sigma_thresholds(1)?;
    let one_sigma = match options.method {
        DevianceKind::ChiSquare => t1,
        DevianceKind::LogLikelihood => 0.5 * t1,
    };
    let accent = LineStyle::dashed(Rgb::ACCENT);

    let mut profiles = Vec::with_capacity(n);
    for (i, (label, display, range)) in selected.iter().enumerate() {
        bar.set_message(display.clone());
        let values = range.linspace(rd);
        let mut curve = Vec::with_capacity(rd);
        for &v in &values {
            let (d, _) = refit_pinned(&mut *guard, &baseline, &[(label.as_str(), v)], &fit_options)?;
            curve.push(d);
            bar.inc(1);
        }
        guard.reset();
        debug!(param = %label, points = rd, "profile done");

        let region = figure.region_mut(grid.diagonal(i));
        region.x_range = Some((range.low, range.high));
        region.push(Primitive::Line {
            points: values.iter().copied().zip(curve.iter().copied()).collect(),
            style: LineStyle::solid(Rgb::BLACK),
        });
        for x in [range.center - range.stderr, range.center, range.center + range.stderr] {
            region.push(Primitive::VLine { x, style: accent });
        }
        region.push(Primitive::HLine {
            y: one_sigma,
            style: LineStyle::dashed(Rgb::GRAY),
        });
        region.title = Some(interval_title(display, range.center, range.stderr, range.stderr));
        if i == n - 1 {
            region.y_label = Some(options.method.axis_label().to_string());
        }

        profiles.push(ProfileCurve {
            label: label.clone(),
            range: *range,
            values,
            deviance: curve,
        });
    }

    let bounds = deviance_bounds(options.contour_dof)?;
    let norm = BandNorm::new(bounds, Palette::sigma())?;
    let mut maps = Vec::with_capacity(n_pairs);
    let mut contour_produced = false;

    for (i, j) in grid.lower_pairs() {
        let (y_label, y_display, y_range) = &selected[i];
        let (x_label, x_display, x_range) = &selected[j];
        bar.set_message(format!("{x_display}, {y_display}"));

        let xs = x_range.linspace(rm);
        let ys = y_range.linspace(rm);
        let mut z = vec![vec![0.0; rm]; rm];
        for (iy, &y) in ys.iter().enumerate() {
            for (ix, &x) in xs.iter().enumerate() {
                let pins = [(x_label.as_str(), x), (y_label.as_str(), y)];
                let (d, is_llh) = refit_pinned(&mut *guard, &baseline, &pins, &fit_options)?;
                z[iy][ix] = if is_llh { 2.0 * d } else { d };
                bar.inc(1);
            }
        }
        guard.reset();

        let Some(id) = grid.get(i, j) else {
            continue;
        };
        let region = figure.region_mut(id);
        region.y_range = Some((y_range.low, y_range.high));
        if j == 0 {
            region.y_label = Some(y_display.clone());
        }
        if i == n - 1 {
            region.x_label = Some(x_display.clone());
        }
        region.push(Primitive::FilledContour(FilledContour {
            x: xs.clone(),
            y: ys.clone(),
            z: z.iter().map(|row| row.iter().map(|d| -d).collect()).collect(),
            norm: norm.clone(),
        }));
        contour_produced = true;

        maps.push(DevianceMap {
            x_label: x_label.clone(),
            y_label: y_label.clone(),
            x: xs,
            y: ys,
            deviance: z,
        });
    }

    if contour_produced {
        if let Some(cbar) = grid.colorbar {
            figure.region_mut(cbar).push(Primitive::Colorbar(Colorbar {
                norm,
                labels: SIGMA_LABELS.iter().map(|s| s.to_string()).collect(),
            }));
        }
    }
    thin_tick_labels(&mut figure, &grid);

    bar.finish_and_clear();
    guard.finish();
    info!(params = n, pairs = n_pairs, "chi-square map generated");

    Ok(ChisquareMap {
        figure,
        colorbar: grid.colorbar,
        grid,
        baseline,
        profiles,
        maps,
    })
}

fn thin_tick_labels(figure: &mut Figure, grid: &AxesGrid) {
    for row in 0..grid.n() {
        for col in 0..=row {
            if let Some(id) = grid.get(row, col) {
                let region = figure.region_mut(id);
                region.x_axis.max_labels = 3;
                region.y_axis.max_labels = 3;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, ParamSet};
    use crate::figure::RegionKind;
    use crate::fit::LinearModelFitter;

    fn quadratic_data() -> Dataset {
        let x: Vec<f64> = (0..25).map(|i| -2.0 + i as f64 * 0.2).collect();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, xi)| 0.5 - 1.5 * xi + 0.8 * xi * xi + 0.05 * ((i * 7 % 5) as f64 - 2.0))
            .collect();
        Dataset {
            sigma: vec![0.05; x.len()],
            x,
            y,
        }
    }

    fn fitted(degree: usize) -> LinearModelFitter {
        let mut f = LinearModelFitter::polynomial("scan", quadratic_data(), degree).unwrap();
        f.fit(true, &FitOptions::default()).unwrap();
        f
    }

    fn small() -> ProfileOptions {
        ProfileOptions {
            resolution_diag: 7,
            resolution_map: 5,
            ..ProfileOptions::default()
        }
    }

    #[test]
    fn builds_triangle_with_profiles_and_maps() {
        let mut engine = fitted(2);
        let out = generate_chisquare_map(&mut engine, &small()).unwrap();
        assert_eq!(out.profiles.len(), 3);
        assert_eq!(out.maps.len(), 3);
        assert_eq!(out.figure.count_kind(RegionKind::Diagonal), 3);
        assert_eq!(out.figure.count_kind(RegionKind::OffDiagonal), 3);
        assert!(out.colorbar.is_some());
        let cbar = out.figure.region(out.colorbar.unwrap());
        assert!(matches!(cbar.primitives.first(), Some(Primitive::Colorbar(_))));

        for (row, col) in out.grid.lower_pairs() {
            let region = out.figure.region(out.grid.get(row, col).unwrap());
            assert!(region.has_contour());
        }
    }

    #[test]
    fn profile_is_quadratic_with_unit_step_at_stderr() {
        let mut engine = fitted(1);
        let opts = ProfileOptions {
            resolution_diag: 7,
            ..small()
        };
        let out = generate_chisquare_map(&mut engine, &opts).unwrap();
        // 7 points over ±3σ land exactly on -3σ..3σ in unit steps.
        for curve in &out.profiles {
            assert!(curve.deviance[3].abs() < 1e-6, "center {}", curve.deviance[3]);
            assert!((curve.deviance[2] - 1.0).abs() < 1e-6);
            assert!((curve.deviance[4] - 1.0).abs() < 1e-6);
            assert!((curve.deviance[0] - 9.0).abs() < 1e-5);
        }
    }

    #[test]
    fn engine_is_restored_after_run() {
        let mut engine = fitted(2);
        let before = engine.snapshot();
        generate_chisquare_map(&mut engine, &small()).unwrap();
        assert_eq!(engine.snapshot(), before);
        assert!(engine.info().is_some());
    }

    #[test]
    fn filter_selects_by_label_substring() {
        let mut engine = fitted(2);
        let opts = ProfileOptions {
            filter: Some(vec!["c1".into()]),
            ..small()
        };
        let out = generate_chisquare_map(&mut engine, &opts).unwrap();
        assert_eq!(out.profiles.len(), 1);
        assert_eq!(out.profiles[0].label, "scan___poly___c1");
        assert!(out.maps.is_empty());
        assert!(out.colorbar.is_none());

        let opts = ProfileOptions {
            filter: Some(vec!["nothing".into()]),
            ..small()
        };
        assert_eq!(generate_chisquare_map(&mut engine, &opts).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn fixed_parameters_are_skipped() {
        let mut engine = fitted(2);
        let mut params = engine.params().clone();
        let value = params.get("scan___poly___c2").unwrap().value;
        params.pin("scan___poly___c2", value).unwrap();
        engine.apply_params(params).unwrap();
        let out = generate_chisquare_map(&mut engine, &small()).unwrap();
        assert_eq!(out.profiles.len(), 2);
    }

    #[test]
    fn unfitted_engine_is_fitted_first() {
        let mut engine = LinearModelFitter::polynomial("scan", quadratic_data(), 1).unwrap();
        assert!(engine.chisqr().is_none());
        let out = generate_chisquare_map(&mut engine, &small()).unwrap();
        assert!(out.baseline.summary.chisqr.is_some());
        assert!(engine.chisqr().is_some());
    }

    #[test]
    fn likelihood_method_halves_the_profile() {
        let mut engine = fitted(1);
        let opts = ProfileOptions {
            method: DevianceKind::LogLikelihood,
            ..small()
        };
        let out = generate_chisquare_map(&mut engine, &opts).unwrap();
        let curve = &out.profiles[0];
        assert!((curve.deviance[2] - 0.5).abs() < 1e-6);
        // Map values are doubled back onto the chi-square scale.
        let map = &out.maps[0];
        let mid = map.deviance[2][2];
        assert!(mid.abs() < 1e-6);
        let diag = out.figure.region(out.grid.diagonal(1));
        assert_eq!(diag.y_label.as_deref(), Some("ΔL"));
    }

    /// Wraps an engine and fails every fit after the first `ok_fits`.
    struct Flaky {
        inner: LinearModelFitter,
        ok_fits: usize,
    }

    impl FitEngine for Flaky {
        fn params(&self) -> &ParamSet {
            self.inner.params()
        }
        fn apply_params(&mut self, params: ParamSet) -> Result<(), AppError> {
            self.inner.apply_params(params)
        }
        fn fit(&mut self, prep_fit: bool, options: &FitOptions) -> Result<(), AppError> {
            if self.ok_fits == 0 {
                return Err(AppError::numeric("refit diverged"));
            }
            self.ok_fits -= 1;
            self.inner.fit(prep_fit, options)
        }
        fn chisqr(&self) -> Option<f64> {
            self.inner.chisqr()
        }
        fn llh_result(&self) -> Option<f64> {
            self.inner.llh_result()
        }
        fn restore(&mut self, snapshot: &FitSnapshot) {
            self.inner.restore(snapshot)
        }
        fn update_info(&mut self) {
            self.inner.update_info()
        }
    }

    #[test]
    fn failed_refit_still_restores_baseline() {
        let mut engine = Flaky {
            inner: fitted(2),
            ok_fits: 10,
        };
        let before = engine.snapshot();
        let err = generate_chisquare_map(&mut engine, &small()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(engine.snapshot(), before);
    }
}
