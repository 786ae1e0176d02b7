//! Figure layouts shared by the plot generators.

pub mod grid;

pub use grid::*;
