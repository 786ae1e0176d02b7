//! Polynomial model evaluation.
//!
//! The linear fitting engine relies on two primitive operations:
//! - build a design row for a given `x` (for least squares)
//! - predict `y(x)` given the coefficients (for residuals)

/// Fill a design row `[1, x, x², ...]`; its length sets the degree.
pub fn fill_design_row(x: f64, out: &mut [f64]) {
    let mut term = 1.0;
    for slot in out.iter_mut() {
        *slot = term;
        term *= x;
    }
}

/// Evaluate `Σ c_k x^k` (Horner).
pub fn predict(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Variable name of the `k`-th coefficient.
pub fn coefficient_name(k: usize) -> String {
    format!("c{k}")
}
