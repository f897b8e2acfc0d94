//! # Fixpoint Solver
//!
//! Worklist iteration over (context, function, block) program points
//! with join/widen/narrow phases, interprocedural analysis in two modes
//! (whole-program descent and modular summaries), a shared global
//! invariant coupling the per-context solves, and a final recording
//! pass that collects verdicts, access events and diagnostics only from
//! the stabilized states.
//!
//! ## References
//! - Bourdoncle "Efficient Chaotic Iteration Strategies with Widenings"
//!   (FMPA 1993)

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{AnalysisReport, Analyzer};
pub use domain::AnalysisState;
pub use infrastructure::{FrameResult, SolverCore};
