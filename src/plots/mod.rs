//! Diagnostic plot generators.
//!
//! Each generator returns a [`crate::figure::Figure`] plus the numbers it was
//! built from; rendering is a separate step.

pub mod correlation;
pub mod labels;
pub mod profile;
pub mod walk;

pub use correlation::*;
pub use profile::*;
pub use walk::*;
