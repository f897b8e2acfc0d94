//! # Non-Local Control-Flow Handler
//!
//! setjmp/longjmp-style save/jump pairs as dynamic CFG edges. The save
//! point flows through normally (binding 0 on first arrival); a jump has
//! no normal successor and instead pushes the current store (global
//! side effects intact, never rolled back) to every live matching save
//! point's continuation with the payload substituted for the binding.
//! Multiple jump sources and the fall-through path join at resumption.

pub mod domain;

pub use domain::{SavePoint, SavePointRegistry};
