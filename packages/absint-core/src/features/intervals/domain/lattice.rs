//! Core lattice operations shared by the abstract domains.
//!
//! Every domain element sits in a partial order with a least upper bound
//! (join, used at control-flow merges) and a greatest lower bound (meet,
//! used when intersecting constraints). Widening and narrowing accelerate
//! and then repair fixpoint iteration on domains with infinite ascending
//! chains.

use std::cmp::Ordering;

/// A lattice element with join, meet, and ordering operations.
pub trait Lattice: Clone + PartialEq + Sized {
    /// The bottom element: unreachable / no information
    fn bottom() -> Self;

    /// The top element: all possible values
    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// Least upper bound, applied at control-flow merges
    fn join(&self, other: &Self) -> Self;

    /// Greatest lower bound, applied when intersecting constraints
    fn meet(&self, other: &Self) -> Self;

    /// Partial ordering: `self ⊑ other` means self is at least as precise
    fn partial_cmp_lattice(&self, other: &Self) -> Option<Ordering>;

    /// Check `self ⊑ other`
    #[inline]
    fn leq(&self, other: &Self) -> bool {
        matches!(
            self.partial_cmp_lattice(other),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// Widening: must guarantee stabilization of any ascending chain.
    /// Domains with finite height can keep the join default.
    #[inline]
    fn widen(&self, other: &Self) -> Self {
        self.join(other)
    }

    /// Narrowing: recovers precision lost to widening in one extra
    /// descending pass.
    #[inline]
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }
}
