//! Fitting engines and the plumbing the profile generator needs around them.
//!
//! Responsibilities:
//!
//! - the [`FitEngine`] interface (fit, snapshot, restore)
//! - scoped restoration of an engine during sweeps ([`SweepGuard`])
//! - a weighted linear least-squares engine ([`LinearModelFitter`])

pub mod engine;
pub mod guard;
pub mod linear;

pub use engine::*;
pub use guard::*;
pub use linear::*;
