//! Domain model for non-local control flow

pub mod savepoint;

pub use savepoint::{SavePoint, SavePointRegistry};
