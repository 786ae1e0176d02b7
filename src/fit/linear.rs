//! Weighted linear least-squares engine over a polynomial basis.
//!
//! Given observations `(x_i, y_i, σ_i)` and coefficients `c_0..c_d` we
//! minimize
//!
//! ```text
//! χ² = Σ ((y_i - Σ_k c_k x_i^k) / σ_i)²
//! ```
//!
//! over the varied coefficients. Fixed coefficients are moved to the left-hand
//! side before solving, which is what a profile sweep needs.
//!
//! Standard errors come from the unscaled covariance `(XᵀX)⁻¹` of the
//! weighted design, so `Δχ² = 1` at `value ± stderr` for a single parameter.
//! The negative log-likelihood is the Gaussian one,
//! `0.5·χ² + Σ ln σ_i + 0.5·n·ln(2π)`.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::domain::{Dataset, FitSnapshot, FitSummary, ParamName, ParamSet, Parameter};
use crate::error::AppError;
use crate::fit::{FitEngine, FitOptions};
use crate::math::{covariance, solve_least_squares};
use crate::models::{coefficient_name, fill_design_row, predict};

/// Model component of the parameter labels produced by this engine.
pub const POLY_MODEL: &str = "poly";

/// Goodness-of-fit statistics refreshed by [`FitEngine::update_info`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitInfo {
    pub ndata: usize,
    pub nvarys: usize,
    pub nfree: usize,
    pub chisqr: f64,
    pub redchi: f64,
}

/// Weighted design matrix and targets (rows scaled by `1/σ_i`).
#[derive(Debug, Clone)]
struct Prepared {
    design: DMatrix<f64>,
    target: DVector<f64>,
    llh_offset: f64,
}

#[derive(Debug, Clone)]
pub struct LinearModelFitter {
    data: Dataset,
    params: ParamSet,
    summary: FitSummary,
    prepared: Option<Prepared>,
    info: Option<FitInfo>,
}

impl LinearModelFitter {
    /// Polynomial of the given degree; parameters are labelled
    /// `source___poly___c0`, `source___poly___c1`, ...
    pub fn polynomial(source: &str, data: Dataset, degree: usize) -> Result<Self, AppError> {
        data.validate()?;
        let params = (0..=degree)
            .map(|k| Parameter::new(ParamName::new(source, POLY_MODEL, coefficient_name(k)), 0.0))
            .collect();
        Ok(Self {
            data,
            params: ParamSet::new(params),
            summary: FitSummary::default(),
            prepared: None,
            info: None,
        })
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn info(&self) -> Option<FitInfo> {
        self.info
    }

    pub fn predict(&self, x: f64) -> f64 {
        predict(&self.params.values(), x)
    }

    fn prepare(&self) -> Result<Prepared, AppError> {
        self.data.validate()?;
        let n = self.data.len();
        let p = self.params.len();
        let mut design = DMatrix::<f64>::zeros(n, p);
        let mut target = DVector::<f64>::zeros(n);
        let mut row = vec![0.0; p];
        for i in 0..n {
            let w = 1.0 / self.data.sigma[i];
            fill_design_row(self.data.x[i], &mut row);
            for (k, v) in row.iter().enumerate() {
                design[(i, k)] = v * w;
            }
            target[i] = self.data.y[i] * w;
        }
        let llh_offset = self.data.sigma.iter().map(|s| s.ln()).sum::<f64>()
            + 0.5 * n as f64 * (2.0 * std::f64::consts::PI).ln();
        Ok(Prepared {
            design,
            target,
            llh_offset,
        })
    }
}

impl FitEngine for LinearModelFitter {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn apply_params(&mut self, params: ParamSet) -> Result<(), AppError> {
        let same_labels = params.len() == self.params.len()
            && params
                .iter()
                .zip(self.params.iter())
                .all(|(a, b)| a.name == b.name);
        if !same_labels {
            return Err(AppError::input(
                "Parameter set does not match the engine's parameters.",
            ));
        }
        self.params = params;
        Ok(())
    }

    fn fit(&mut self, prep_fit: bool, options: &FitOptions) -> Result<(), AppError> {
        if prep_fit || self.prepared.is_none() {
            self.prepared = Some(self.prepare()?);
        }
        let Some(prep) = self.prepared.as_ref() else {
            return Err(AppError::numeric("Fit engine was not prepared."));
        };

        let varied: Vec<usize> = (0..self.params.len())
            .filter(|&k| self.params.by_index(k).is_some_and(|p| p.vary))
            .collect();
        let n = prep.design.nrows();
        if varied.len() > n {
            return Err(AppError::numeric(format!(
                "{} varied parameters but only {n} data points.",
                varied.len()
            )));
        }

        // Move fixed terms to the target side.
        let mut target = prep.target.clone();
        for (k, p) in self.params.iter().enumerate() {
            if p.vary {
                continue;
            }
            if !p.value.is_finite() {
                return Err(AppError::numeric(format!(
                    "Fixed parameter '{}' is not finite.",
                    p.name.label()
                )));
            }
            target -= prep.design.column(k) * p.value;
        }

        let mut residual = target.clone();
        if !varied.is_empty() {
            let sub = prep.design.select_columns(&varied);
            let beta = solve_least_squares(&sub, &target)
                .ok_or_else(|| AppError::numeric("Least squares solve failed (ill-conditioned design)."))?;
            residual -= &sub * &beta;

            let cov = covariance(&sub);
            if cov.is_none() {
                warn!("covariance unavailable; standard errors cleared");
            }
            for (col, &k) in varied.iter().enumerate() {
                if let Some(p) = self.params.by_index_mut(k) {
                    p.value = beta[col];
                    p.stderr = cov.as_ref().map(|c| c[(col, col)].max(0.0).sqrt());
                }
            }
        }

        let chisqr = residual.norm_squared();
        if !chisqr.is_finite() {
            return Err(AppError::numeric("Chi-square is not finite."));
        }
        self.summary = FitSummary {
            chisqr: Some(chisqr),
            llh: options.llh_selected.then(|| 0.5 * chisqr + prep.llh_offset),
        };
        debug!(chisqr, nvarys = varied.len(), prep_fit, "linear fit");
        Ok(())
    }

    fn chisqr(&self) -> Option<f64> {
        self.summary.chisqr
    }

    fn llh_result(&self) -> Option<f64> {
        self.summary.llh
    }

    fn restore(&mut self, snapshot: &FitSnapshot) {
        self.params = snapshot.params.clone();
        self.summary = snapshot.summary;
    }

    fn update_info(&mut self) {
        self.info = self.summary.chisqr.map(|chisqr| {
            let ndata = self.data.len();
            let nvarys = self.params.iter().filter(|p| p.vary).count();
            let nfree = ndata.saturating_sub(nvarys);
            FitInfo {
                ndata,
                nvarys,
                nfree,
                chisqr,
                redchi: if nfree > 0 { chisqr / nfree as f64 } else { f64::NAN },
            }
        });
    }
}
