//! Chi-square quantiles by numeric root finding.
//!
//! For a target cumulative probability `p` we solve `F(t; k) - p = 0` where
//! `F` is the chi-square CDF with `k` degrees of freedom.
//!
//! Convergence policy:
//! 1. Newton iterations from `t = 1` (the CDF derivative is the PDF).
//! 2. If Newton stalls or leaves the domain, bisection on a bracket that is
//!    doubled until it contains the root.
//! 3. If no bracket can be found, return an error instead of a bogus level.

use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF};
use tracing::debug;

use crate::error::AppError;

/// Two-sided Gaussian coverage of 1σ, 2σ and 3σ.
pub const SIGMA_PROBABILITIES: [f64; 3] = [0.682689492, 0.954499736, 0.997300204];

const NEWTON_MAX_ITERS: usize = 100;
const BISECT_MAX_ITERS: usize = 200;
const MAX_BRACKET_DOUBLINGS: usize = 64;
const TOL: f64 = 1e-12;

/// Threshold `t` with `P(χ²_dof <= t) = p`.
pub fn chi2_quantile(p: f64, dof: u32) -> Result<f64, AppError> {
    if !(p.is_finite() && p > 0.0 && p < 1.0) {
        return Err(AppError::input(format!("Chi-square quantile needs 0 < p < 1, got {p}.")));
    }
    if dof == 0 {
        return Err(AppError::input("Chi-square quantile needs at least one degree of freedom."));
    }
    let dist = ChiSquared::new(dof as f64)
        .map_err(|e| AppError::numeric(format!("Chi-square distribution error: {e}")))?;

    if let Some(t) = newton(&dist, p, 1.0) {
        return Ok(t);
    }
    debug!(p, dof, "newton did not converge, falling back to bisection");
    bisect(&dist, p).ok_or_else(|| {
        AppError::numeric(format!(
            "Chi-square quantile did not converge (p={p}, dof={dof})."
        ))
    })
}

/// Deviance thresholds for 1σ, 2σ and 3σ (in that order).
pub fn sigma_thresholds(dof: u32) -> Result<[f64; 3], AppError> {
    let mut out = [0.0; 3];
    for (slot, &p) in out.iter_mut().zip(SIGMA_PROBABILITIES.iter()) {
        *slot = chi2_quantile(p, dof)?;
    }
    Ok(out)
}

fn newton(dist: &ChiSquared, p: f64, start: f64) -> Option<f64> {
    let mut t = start;
    for _ in 0..NEWTON_MAX_ITERS {
        let f = dist.cdf(t) - p;
        if f.abs() < TOL {
            return Some(t);
        }
        let slope = dist.pdf(t);
        if !(slope.is_finite() && slope > 0.0) {
            return None;
        }
        let mut next = t - f / slope;
        if next <= 0.0 {
            // Stay inside the support.
            next = t / 2.0;
        }
        if !next.is_finite() {
            return None;
        }
        if (next - t).abs() <= TOL * t.max(1.0) {
            return Some(next);
        }
        t = next;
    }
    None
}

fn bisect(dist: &ChiSquared, p: f64) -> Option<f64> {
    let mut lo = 0.0;
    let mut hi = 1.0;
    let mut doublings = 0;
    while dist.cdf(hi) < p {
        lo = hi;
        hi *= 2.0;
        doublings += 1;
        if doublings > MAX_BRACKET_DOUBLINGS {
            return None;
        }
    }
    for _ in 0..BISECT_MAX_ITERS {
        let mid = 0.5 * (lo + hi);
        if dist.cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= TOL * hi.max(1.0) {
            break;
        }
    }
    let t = 0.5 * (lo + hi);
    t.is_finite().then_some(t)
}
