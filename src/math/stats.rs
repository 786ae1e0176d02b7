//! Sample statistics on flat slices.

use crate::error::AppError;

/// Percentiles used for the asymmetric ±1σ credible interval.
pub const CREDIBLE_PERCENTILES: [f64; 3] = [15.87, 50.0, 84.13];

/// Percentiles `qs` (0..=100) of `values` with linear interpolation between
/// order statistics (numpy's default method).
pub fn percentiles(values: &[f64], qs: &[f64]) -> Result<Vec<f64>, AppError> {
    if values.is_empty() {
        return Err(AppError::new(3, "Cannot compute percentiles of an empty sample."));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(AppError::numeric("Sample contains NaN values."));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    qs.iter()
        .map(|&q| {
            if !(0.0..=100.0).contains(&q) {
                return Err(AppError::input(format!("Percentile {q} outside [0, 100].")));
            }
            let pos = q / 100.0 * (n as f64 - 1.0);
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
        })
        .collect()
}

pub fn median(values: &[f64]) -> Result<f64, AppError> {
    Ok(percentiles(values, &[50.0])?[0])
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    #[test]
    fn percentiles_interpolate_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        let q = percentiles(&v, &[0.0, 50.0, 100.0, 25.0]).unwrap();
        assert_eq!(q[0], 1.0);
        assert!((q[1] - 2.5).abs() < 1e-12);
        assert_eq!(q[2], 4.0);
        assert!((q[3] - 1.75).abs() < 1e-12);
    }

    #[test]
    fn credible_interval_is_symmetric_for_normal_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(5.0, 2.0).unwrap();
        let sample: Vec<f64> = (0..50_000).map(|_| normal.sample(&mut rng)).collect();

        let q = percentiles(&sample, &CREDIBLE_PERCENTILES).unwrap();
        let (lo, mid, hi) = (q[0], q[1], q[2]);
        assert!(lo < mid && mid < hi);
        assert!((mid - 5.0).abs() < 0.05, "median {mid}");
        let minus = mid - lo;
        let plus = hi - mid;
        assert!((minus - plus).abs() < 0.1, "minus={minus} plus={plus}");
        assert!((minus - 2.0).abs() < 0.1);
    }

    #[test]
    fn population_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&v).unwrap() - 2.0).abs() < 1e-12);
        assert!(std_dev(&[]).is_none());
    }

    #[test]
    fn empty_sample_is_an_error() {
        assert!(percentiles(&[], &[50.0]).is_err());
    }
}
