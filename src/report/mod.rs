//! Reporting utilities: fit residuals, pull rankings and formatted terminal
//! output.

pub mod format;

pub use format::*;

use crate::error::AppError;
use crate::fit::{FitEngine, LinearModelFitter};
use crate::models::predict;

/// One observation against the fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residual {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    /// `(y_obs - y_fit) / sigma`.
    pub pull: f64,
}

/// Fitted values and pulls for every data point.
pub fn compute_residuals(fitter: &LinearModelFitter) -> Result<Vec<Residual>, AppError> {
    let coeffs = fitter.params().values();
    let data = fitter.data();
    let mut out = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        let y_fit = predict(&coeffs, data.x[i]);
        if !y_fit.is_finite() {
            return Err(AppError::numeric("Non-finite model prediction during residual computation."));
        }
        out.push(Residual {
            x: data.x[i],
            y_obs: data.y[i],
            y_fit,
            pull: (data.y[i] - y_fit) / data.sigma[i],
        });
    }
    Ok(out)
}

/// The `top_n` residuals with the largest absolute pull.
pub fn rank_pulls(residuals: &[Residual], top_n: usize) -> Vec<Residual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.pull.abs().total_cmp(&a.pull.abs()));
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dataset;
    use crate::fit::FitOptions;

    #[test]
    fn residuals_and_pulls() {
        let data = Dataset {
            x: vec![0.0, 1.0, 2.0, 3.0],
            y: vec![1.0, 1.0, 1.0, 3.0],
            sigma: vec![0.5; 4],
        };
        let mut fitter = LinearModelFitter::polynomial("d", data, 0).unwrap();
        fitter.fit(true, &FitOptions::default()).unwrap();
        let res = compute_residuals(&fitter).unwrap();
        assert_eq!(res.len(), 4);
        assert!((res[0].y_fit - 1.5).abs() < 1e-12);
        assert!((res[3].pull - 3.0).abs() < 1e-12);

        let worst = rank_pulls(&res, 1);
        assert_eq!(worst.len(), 1);
        assert_eq!(worst[0].x, 3.0);
    }
}
