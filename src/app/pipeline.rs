//! Shared command pipelines.
//!
//! Each pipeline loads its input, runs one generator, writes the SVG (and an
//! optional JSON export) and hands the computed outputs back for printing:
//!
//! - chain file -> correlation plot -> SVG (+ intervals JSON)
//! - chain file -> walk plot -> SVG
//! - dataset -> linear fit -> chi-square map -> SVG (+ profiles JSON)

use std::path::{Path, PathBuf};

use tracing::info;

use crate::chain::{ChainReader, JsonChainFile, demo_specs, synthetic_gaussian_chain, write_chain_json};
use crate::domain::DevianceKind;
use crate::error::AppError;
use crate::figure::render::save_svg;
use crate::fit::{FitEngine, FitOptions, LinearModelFitter};
use crate::io::{read_dataset_json, write_intervals_json, write_profiles_json};
use crate::plots::{
    ChisquareMap, CorrelationOptions, CorrelationPlot, ProfileOptions, WalkOptions, WalkPlot,
    generate_chisquare_map, generate_correlation_plot, generate_walk_plot,
};

/// Source component of the parameter labels produced by `profile`.
pub const DATASET_SOURCE: &str = "data";

/// Outputs of a `corner` run.
#[derive(Debug, Clone)]
pub struct CornerRun {
    pub plot: CorrelationPlot,
    pub svg: PathBuf,
}

pub fn run_corner(
    chain: &Path,
    options: &CorrelationOptions,
    svg: &Path,
    export: Option<&Path>,
) -> Result<CornerRun, AppError> {
    let reader = JsonChainFile::open(chain)?;
    let plot = generate_correlation_plot(&reader, options)?;
    save_svg(&plot.figure, svg)?;
    if let Some(path) = export {
        write_intervals_json(path, &plot.intervals)?;
        info!(path = %path.display(), "intervals exported");
    }
    Ok(CornerRun {
        plot,
        svg: svg.to_path_buf(),
    })
}

/// Outputs of a `walk` run.
#[derive(Debug, Clone)]
pub struct WalkRun {
    pub plot: WalkPlot,
    pub svg: PathBuf,
}

pub fn run_walk(chain: &Path, options: &WalkOptions, svg: &Path) -> Result<WalkRun, AppError> {
    let reader = JsonChainFile::open(chain)?;
    let plot = generate_walk_plot(&reader, options)?;
    save_svg(&plot.figure, svg)?;
    Ok(WalkRun {
        plot,
        svg: svg.to_path_buf(),
    })
}

/// Outputs of a `profile` run; `fitter` is back at its best fit.
#[derive(Debug, Clone)]
pub struct ProfileRun {
    pub fitter: LinearModelFitter,
    pub map: ChisquareMap,
    pub svg: PathBuf,
}

pub fn run_profile(
    data: &Path,
    degree: usize,
    options: &ProfileOptions,
    svg: &Path,
    export: Option<&Path>,
) -> Result<ProfileRun, AppError> {
    let dataset = read_dataset_json(data)?;
    let mut fitter = LinearModelFitter::polynomial(DATASET_SOURCE, dataset, degree)?;
    let fit_options = FitOptions {
        llh_selected: options.fit.llh_selected
            || options.method == DevianceKind::LogLikelihood,
    };
    fitter.fit(true, &fit_options)?;
    fitter.update_info();

    let map = generate_chisquare_map(&mut fitter, options)?;
    save_svg(&map.figure, svg)?;
    if let Some(path) = export {
        write_profiles_json(path, &map.baseline, &map.profiles)?;
        info!(path = %path.display(), "profiles exported");
    }
    Ok(ProfileRun {
        fitter,
        map,
        svg: svg.to_path_buf(),
    })
}

/// Write a synthetic chain file; returns the labels written.
pub fn run_demo_chain(out: &Path, steps: usize, walkers: usize, seed: u64) -> Result<Vec<String>, AppError> {
    let chain = synthetic_gaussian_chain(&demo_specs(), steps, walkers, seed)?;
    let labels = chain.labels()?;
    write_chain_json(out, &labels, &chain.chain()?)?;
    info!(path = %out.display(), steps, walkers, "demo chain written");
    Ok(labels)
}
