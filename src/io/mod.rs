//! Input/output helpers.
//!
//! - dataset JSON ingest (`dataset`)
//! - result exports (JSON) (`export`)
//!
//! Chain files live in [`crate::chain`].

pub mod dataset;
pub mod export;

pub use dataset::*;
pub use export::*;
