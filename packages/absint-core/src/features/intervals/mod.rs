//! # Interval Domain
//!
//! Integer range abstraction with the standard widening/narrowing pair:
//! join is the convex hull, widening extrapolates unstable bounds to ±∞
//! after a configurable number of revisits, one non-widened descending
//! pass narrows the result back to branch-derived bounds.
//!
//! ## References
//! - Cousot & Cousot "Abstract Interpretation: A Unified Lattice Model" (POPL 1977)
//! - Cousot & Cousot "Comparing the Galois Connection and Widening/Narrowing
//!   Approaches to Abstract Interpretation" (PLILP 1992)

pub mod domain;

pub use domain::{Bound, Interval, Lattice};
