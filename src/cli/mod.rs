//! Command-line parsing for the fit diagnostics plotter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! generators; `crate::app` turns these structs into library options.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::domain::{LabelStyle, Selection};
use crate::error::AppError;
use crate::plots::BinSpec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fitplot", version, about = "Diagnostic plots for curve-fitting results")]
pub struct Cli {
    /// Directory for generated files (relative output paths are placed here).
    #[arg(long, global = true, env = "FITPLOT_OUT_DIR", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Show progress bars on stderr.
    #[arg(long, global = true)]
    pub progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Corner plot (marginals + 2D credible regions) from a chain file.
    Corner(CornerArgs),
    /// Walker trace plot from a chain file.
    Walk(WalkArgs),
    /// Fit a polynomial to a dataset and draw its chi-square/likelihood map.
    Profile(ProfileArgs),
    /// Write a synthetic Gaussian chain file for trying out the other commands.
    DemoChain(DemoChainArgs),
}

/// Which parts of hierarchical parameter names appear in labels.
#[derive(Debug, Args, Clone, Copy)]
pub struct LabelArgs {
    /// Include the source component in labels.
    #[arg(long)]
    pub source: bool,

    /// Drop the model component from labels.
    #[arg(long)]
    pub no_model: bool,
}

impl LabelArgs {
    pub fn style(&self) -> LabelStyle {
        LabelStyle {
            source: self.source,
            model: !self.no_model,
        }
    }
}

/// Percentage window over chain steps.
#[derive(Debug, Args, Clone, Copy)]
pub struct SelectionArgs {
    /// Start of the step window (percent).
    #[arg(long, default_value_t = 0.0)]
    pub start: f64,

    /// End of the step window (percent).
    #[arg(long, default_value_t = 100.0)]
    pub end: f64,
}

impl SelectionArgs {
    pub fn selection(&self) -> Result<Selection, AppError> {
        Selection::new(self.start, self.end)
    }
}

#[derive(Debug, Parser, Clone)]
pub struct CornerArgs {
    /// Chain JSON file.
    #[arg(long, value_name = "JSON")]
    pub chain: PathBuf,

    /// Only plot parameters whose label contains this text (repeatable).
    #[arg(long)]
    pub filter: Vec<String>,

    /// Histogram bins: one value for all parameters, or one per parameter.
    #[arg(long, value_delimiter = ',')]
    pub bins: Vec<usize>,

    #[command(flatten)]
    pub window: SelectionArgs,

    #[command(flatten)]
    pub labels: LabelArgs,

    /// Output SVG file.
    #[arg(long, value_name = "SVG")]
    pub out: Option<PathBuf>,

    /// Export credible intervals to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

impl CornerArgs {
    pub fn bin_spec(&self) -> BinSpec {
        match self.bins.as_slice() {
            [] => BinSpec::Auto,
            [n] => BinSpec::All(*n),
            many => BinSpec::PerParameter(many.iter().map(|&n| Some(n)).collect()),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct WalkArgs {
    /// Chain JSON file.
    #[arg(long, value_name = "JSON")]
    pub chain: PathBuf,

    /// Only plot parameters whose label contains this text (repeatable).
    #[arg(long)]
    pub filter: Vec<String>,

    #[command(flatten)]
    pub window: SelectionArgs,

    /// Draw at most this many walkers.
    #[arg(long)]
    pub max_walkers: Option<usize>,

    #[command(flatten)]
    pub labels: LabelArgs,

    /// Output SVG file.
    #[arg(long, value_name = "SVG")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ProfileArgs {
    /// Dataset JSON file (`x`, `y`, optional `sigma`).
    #[arg(long, value_name = "JSON")]
    pub data: PathBuf,

    /// Polynomial degree.
    #[arg(long, default_value_t = 1)]
    pub degree: usize,

    /// Only profile parameters whose label contains this text (repeatable).
    #[arg(long)]
    pub filter: Vec<String>,

    /// Use the negative log-likelihood instead of chi-square.
    #[arg(long)]
    pub llh: bool,

    /// Points per 1D profile.
    #[arg(long, default_value_t = 15)]
    pub resolution_diag: usize,

    /// Points per axis of each 2D map.
    #[arg(long, default_value_t = 15)]
    pub resolution_map: usize,

    /// Degrees of freedom for the 2D confidence bands.
    #[arg(long, default_value_t = 1)]
    pub contour_dof: u32,

    /// Number of largest pulls to print.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    #[command(flatten)]
    pub labels: LabelArgs,

    /// Output SVG file.
    #[arg(long, value_name = "SVG")]
    pub out: Option<PathBuf>,

    /// Export the baseline fit and profiles to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoChainArgs {
    /// Output chain JSON file.
    #[arg(long, value_name = "JSON")]
    pub out: PathBuf,

    #[arg(long, default_value_t = 1000)]
    pub steps: usize,

    #[arg(long, default_value_t = 20)]
    pub walkers: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Place `out` (or `default_name`) under `out_dir` unless it is absolute.
pub fn resolve_output(out: Option<&Path>, out_dir: Option<&Path>, default_name: &str) -> PathBuf {
    let file = out.map_or_else(|| PathBuf::from(default_name), Path::to_path_buf);
    match out_dir {
        Some(dir) if file.is_relative() => dir.join(file),
        _ => file,
    }
}

/// `None` for an empty filter list.
pub fn filter_option(filter: &[String]) -> Option<Vec<String>> {
    (!filter.is_empty()).then(|| filter.to_vec())
}
