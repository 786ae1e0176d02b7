//! Weighted least squares solver.
//!
//! The linear fitting engine repeatedly solves small problems of the form:
//!
//! ```text
//! minimize Σ ((y_i - x_i^T β) / σ_i)^2
//! ```
//!
//! Rows are scaled by `1/σ_i` before solving, so callers pass an already
//! weighted design matrix.
//!
//! Implementation choices:
//! - SVD solve with a relative rank cutoff; tall systems are the norm here.
//! - The covariance `(XᵀX)⁻¹` is only needed for standard errors and may be
//!   unavailable for degenerate designs; callers treat that as "no stderr".

use nalgebra::{DMatrix, DVector};

/// Relative singular value cutoff below which a direction counts as degenerate.
const RANK_RTOL: f64 = 1e-12;

/// Minimum-norm least squares solution of `x β ≈ y` via SVD.
///
/// Singular values below `RANK_RTOL · σ_max` are dropped. Returns `None` for
/// an all-zero design or a non-finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    if !(sigma_max.is_finite() && sigma_max > 0.0) {
        return None;
    }
    let beta = svd.solve(y, RANK_RTOL * sigma_max).ok()?;
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Parameter covariance `(XᵀX)⁻¹` for a weighted design matrix.
pub fn covariance(x: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let xtx = x.transpose() * x;
    let cov = xtx.try_inverse()?;
    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn zero_design_has_no_solution() {
        let x = DMatrix::zeros(3, 2);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn covariance_of_constant_model_is_one_over_n() {
        let x = DMatrix::from_element(4, 1, 1.0);
        let cov = covariance(&x).unwrap();
        assert!((cov[(0, 0)] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn covariance_of_collinear_design_is_none() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert!(covariance(&x).is_none());
    }
}
