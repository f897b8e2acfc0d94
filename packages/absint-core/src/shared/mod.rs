//! Shared layer: input model used by every feature slice.

pub mod models;
