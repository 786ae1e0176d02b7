//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - structured parameter names and parameter sets (`ParamName`, `ParamSet`)
//! - fit snapshots used to restore engine state (`FitSnapshot`)
//! - sweep ranges, chain selections and credible intervals

pub mod types;

pub use types::*;
