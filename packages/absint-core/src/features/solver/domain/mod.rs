//! Domain model for the solver

pub mod state;

pub use state::AnalysisState;
