//! Application layer: the analyzer facade

pub mod analyzer;

pub use analyzer::{AnalysisReport, Analyzer};
