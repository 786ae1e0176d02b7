//! Numeric utilities: least squares, chi-square quantiles, sample statistics,
//! histograms and contour levels.

pub mod chi2;
pub mod histogram;
pub mod levels;
pub mod ols;
pub mod stats;

pub use chi2::*;
pub use histogram::*;
pub use levels::*;
pub use ols::*;
pub use stats::*;
