//! Infrastructure for the solver
//!
//! - eval: abstract expression evaluation and memory access
//! - transfer: per-statement transfer functions
//! - fixpoint: the worklist engine and solver-wide state

pub mod eval;
pub mod fixpoint;
pub mod transfer;

pub use eval::Exec;
pub use fixpoint::{FrameResult, SolverCore};
pub use transfer::Flow;
