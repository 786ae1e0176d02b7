//! Interface to a fitting engine that the profile generator drives.

use crate::domain::{FitSnapshot, FitSummary, ParamSet};
use crate::error::AppError;

/// Options forwarded to every fit call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitOptions {
    /// Report a negative log-likelihood alongside chi-square.
    pub llh_selected: bool,
}

/// A stateful fitting engine.
///
/// The engine owns the current parameter set and the result of its last fit.
/// Callers that temporarily modify it (pinning parameters, refitting) take a
/// [`FitSnapshot`] first and hand it back through [`FitEngine::restore`].
pub trait FitEngine {
    fn params(&self) -> &ParamSet;

    /// Replace the current parameter set; labels must match the engine's.
    fn apply_params(&mut self, params: ParamSet) -> Result<(), AppError>;

    /// Optimize all varied parameters. `prep_fit` requests the one-time
    /// preparation done before a first fit.
    fn fit(&mut self, prep_fit: bool, options: &FitOptions) -> Result<(), AppError>;

    /// Chi-square of the last fit, `None` before any fit.
    fn chisqr(&self) -> Option<f64>;

    /// Negative log-likelihood of the last fit, if it was requested.
    fn llh_result(&self) -> Option<f64>;

    fn snapshot(&self) -> FitSnapshot {
        FitSnapshot {
            params: self.params().clone(),
            summary: FitSummary {
                chisqr: self.chisqr(),
                llh: self.llh_result(),
            },
        }
    }

    /// Put the engine back into exactly the captured state.
    fn restore(&mut self, snapshot: &FitSnapshot);

    /// Recompute derived statistics after parameters changed from outside.
    fn update_info(&mut self);
}
