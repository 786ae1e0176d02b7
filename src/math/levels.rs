//! Contour boundary sets for deviance surfaces and sampled densities.

use crate::error::AppError;
use crate::math::chi2::sigma_thresholds;

/// Cumulative probability mass enclosed by the 1σ, 2σ and 3σ contours of a
/// 2D Gaussian: `1 - exp(-k²/2)`.
pub fn hdr_mass_levels() -> [f64; 3] {
    [1.0, 2.0, 3.0].map(|k: f64| 1.0 - (-0.5 * k * k).exp())
}

/// Boundaries `[-t3, -t2, -t1, 0]` for a negated deviance surface.
pub fn deviance_bounds(dof: u32) -> Result<Vec<f64>, AppError> {
    let [t1, t2, t3] = sigma_thresholds(dof)?;
    Ok(vec![-t3, -t2, -t1, 0.0])
}

/// Highest-density-region thresholds for the 1σ, 2σ and 3σ mass levels.
///
/// Densities are sorted in descending order and accumulated; the threshold for
/// a level is the smallest density whose cumulative mass fraction is still
/// within that level. When no density qualifies (a single dominant bin), the
/// largest density is used. The output is non-increasing.
pub fn hdr_thresholds(density: &[f64]) -> Option<[f64; 3]> {
    if density.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = density.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let largest = sorted[0];

    let total: f64 = sorted.iter().sum();
    let mut out = [largest; 3];
    if !(total.is_finite() && total > 0.0) {
        return Some(out);
    }

    let mut cumulative = Vec::with_capacity(sorted.len());
    let mut acc = 0.0;
    for &d in &sorted {
        acc += d;
        cumulative.push(acc / total);
    }

    for (slot, level) in out.iter_mut().zip(hdr_mass_levels()) {
        // `cumulative` is non-decreasing, so the qualifying prefix is contiguous.
        let within = cumulative.partition_point(|&c| c <= level);
        if within > 0 {
            *slot = sorted[within - 1];
        }
    }
    Some(out)
}

/// Sorted unique boundaries `{max density, thresholds}` for a filled contour of
/// a normalized density grid.
pub fn density_bounds(rows: &[Vec<f64>]) -> Vec<f64> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let Some(thresholds) = hdr_thresholds(&flat) else {
        return Vec::new();
    };
    let max = flat.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut bounds: Vec<f64> = thresholds.to_vec();
    bounds.push(max);
    bounds.sort_by(|a, b| a.total_cmp(b));
    bounds.dedup();
    bounds
}
