//! Feature slices, one vertical per analysis concern.
//!
//! Dependency direction: intervals and memory are leaf domains; locking,
//! scheduling, nonlocal and summaries build on them; solver drives them
//! all and owns the only mutable run-wide state.

pub mod intervals;
pub mod locking;
pub mod memory;
pub mod nonlocal;
pub mod scheduling;
pub mod solver;
pub mod summaries;
