//! Interval domain models
//!
//! - Lattice: shared lattice trait (join/meet/widen/narrow)
//! - Interval: integer ranges with branch refinement

pub mod interval;
pub mod lattice;

pub use interval::{Bound, Interval};
pub use lattice::Lattice;
