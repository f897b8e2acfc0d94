//! Infrastructure for the region model

pub mod resolver;

pub use resolver::PlaceResolver;
