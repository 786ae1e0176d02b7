//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - runs the requested generator pipeline
//! - prints reports

use chrono::Local;
use clap::Parser;
use tracing::debug;

use crate::cli::{
    Cli, Command, CornerArgs, DemoChainArgs, ProfileArgs, WalkArgs, filter_option, resolve_output,
};
use crate::domain::DevianceKind;
use crate::error::AppError;
use crate::fit::{FitEngine, FitOptions};
use crate::plots::{CorrelationOptions, ProfileOptions, WalkOptions};
use crate::report::{
    compute_residuals, format_header, format_interval_table, format_param_table, format_pull_table,
    rank_pulls,
};

pub mod pipeline;

/// Entry point for the `fitplot` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` values must be visible before clap reads `env = ...` options.
    let dotenv = dotenvy::dotenv();
    crate::logging::init_logging();
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    let cli = Cli::parse();
    let ctx = Context {
        out_dir: cli.out_dir,
        progress: cli.progress,
    };
    match cli.command {
        Command::Corner(args) => handle_corner(&ctx, args),
        Command::Walk(args) => handle_walk(&ctx, args),
        Command::Profile(args) => handle_profile(&ctx, args),
        Command::DemoChain(args) => handle_demo_chain(&ctx, args),
    }
}

/// Options shared by every subcommand.
struct Context {
    out_dir: Option<std::path::PathBuf>,
    progress: bool,
}

fn handle_corner(ctx: &Context, args: CornerArgs) -> Result<(), AppError> {
    let options = CorrelationOptions {
        filter: filter_option(&args.filter),
        bins: args.bin_spec(),
        selection: args.window.selection()?,
        labels: args.labels.style(),
        progress: ctx.progress,
    };
    let svg = resolve_output(args.out.as_deref(), ctx.out_dir.as_deref(), "corner.svg");
    let export = args
        .export
        .as_deref()
        .map(|p| resolve_output(Some(p), ctx.out_dir.as_deref(), "intervals.json"));

    let run = pipeline::run_corner(&args.chain, &options, &svg, export.as_deref())?;
    print!("{}", format_header("corner", Local::now()));
    println!("{}", format_interval_table(&run.plot.intervals));
    println!("Wrote {}", run.svg.display());
    Ok(())
}

fn handle_walk(ctx: &Context, args: WalkArgs) -> Result<(), AppError> {
    let options = WalkOptions {
        filter: filter_option(&args.filter),
        selection: args.window.selection()?,
        max_walkers: args.max_walkers,
        labels: args.labels.style(),
        progress: ctx.progress,
    };
    let svg = resolve_output(args.out.as_deref(), ctx.out_dir.as_deref(), "walk.svg");

    let run = pipeline::run_walk(&args.chain, &options, &svg)?;
    print!("{}", format_header("walk", Local::now()));
    for (label, median) in run.plot.labels.iter().zip(&run.plot.medians) {
        println!("{label:<28} median={median:.6}");
    }
    println!("Wrote {}", run.svg.display());
    Ok(())
}

fn handle_profile(ctx: &Context, args: ProfileArgs) -> Result<(), AppError> {
    let method = if args.llh {
        DevianceKind::LogLikelihood
    } else {
        DevianceKind::ChiSquare
    };
    let options = ProfileOptions {
        filter: filter_option(&args.filter),
        method,
        resolution_diag: args.resolution_diag,
        resolution_map: args.resolution_map,
        fit: FitOptions {
            llh_selected: args.llh,
        },
        labels: args.labels.style(),
        contour_dof: args.contour_dof,
        progress: ctx.progress,
    };
    let svg = resolve_output(args.out.as_deref(), ctx.out_dir.as_deref(), "profile.svg");
    let export = args
        .export
        .as_deref()
        .map(|p| resolve_output(Some(p), ctx.out_dir.as_deref(), "profiles.json"));

    let run = pipeline::run_profile(&args.data, args.degree, &options, &svg, export.as_deref())?;
    print!("{}", format_header("profile", Local::now()));
    println!("{}", format_param_table(run.fitter.params(), run.fitter.info()));

    let residuals = compute_residuals(&run.fitter)?;
    println!("Largest pulls:");
    println!("{}", format_pull_table(&rank_pulls(&residuals, args.top)));
    println!("Wrote {}", run.svg.display());
    Ok(())
}

fn handle_demo_chain(ctx: &Context, args: DemoChainArgs) -> Result<(), AppError> {
    let out = resolve_output(Some(args.out.as_path()), ctx.out_dir.as_deref(), "chain.json");
    let labels = pipeline::run_demo_chain(&out, args.steps, args.walkers, args.seed)?;
    println!(
        "Wrote {} ({} steps x {} walkers: {})",
        out.display(),
        args.steps,
        args.walkers,
        labels.join(", ")
    );
    Ok(())
}
