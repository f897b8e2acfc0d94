//! Domain models for the region/points-to layer
//!
//! - Region / RegionTable: interned symbolic memory locations
//! - AbstractValue / Targets: interval × points-to product values
//! - AbstractStore: region → value mapping flowing through the solver

pub mod abstract_value;
pub mod region;
pub mod store;

pub use abstract_value::{AbstractValue, Targets};
pub use region::{RegionId, RegionKind, RegionTable};
pub use store::AbstractStore;
