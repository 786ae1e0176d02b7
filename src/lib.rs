//! `fitplot` library crate.
//!
//! The binary (`fitplot`) is a thin wrapper around this library so that:
//!
//! - generators are testable without spawning processes or rendering
//! - the fitting engine and chain storage are pluggable through traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chain;
pub mod cli;
pub mod domain;
pub mod error;
pub mod figure;
pub mod fit;
pub mod io;
pub mod layout;
pub mod logging;
pub mod math;
pub mod models;
pub mod plots;
pub mod progress;
pub mod report;
