//! Model families available to the linear fitting engine.
//!
//! Models are implemented as small, pure functions so the engine can stay
//! generic over the basis.

pub mod model;

pub use model::*;
