//! # Modular Summary Engine
//!
//! Per-function global-effect summaries: regions read, regions written,
//! regions escaping through the return value, and the abstract result.
//! Summaries are computed bottom-up where the call graph allows and
//! iterated to fixpoint where it does not; a function the analysis
//! cannot see gets the top summary (any global touched, result unknown).

pub mod domain;

pub use domain::{Summary, SummaryStore};
