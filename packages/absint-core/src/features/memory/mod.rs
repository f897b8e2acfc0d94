//! # Region Model and Points-To Domain
//!
//! Abstracts memory into a finite set of interned symbolic regions
//! (globals, stack slots, heap allocation sites, struct field paths) and
//! tracks, for every region, an interval × points-to product value.
//!
//! Soundness rules baked in here:
//! - opaque accessor returns may alias any previously escaped region of
//!   compatible type; disjointness is never assumed without evidence
//! - field regions are stable under struct nesting: overlap between
//!   `Field(Field(r, s), f)` and `Field(r', f)` is decided by the
//!   innermost (struct, field) type key, covering both nesting directions
//! - strong updates only on single concrete cells; heap-site summaries
//!   always take weak updates
//!
//! ## References
//! - Andersen "Program Analysis and Specialization for C" (PhD 1994)
//! - Pearce et al. "Efficient Field-Sensitive Pointer Analysis" (CC 2004)

pub mod domain;
pub mod infrastructure;

pub use domain::{AbstractStore, AbstractValue, RegionId, RegionKind, RegionTable, Targets};
pub use infrastructure::PlaceResolver;
