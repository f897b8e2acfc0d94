//! Abstract values: the product of an interval and a points-to set.
//!
//! Integers carry a meaningful interval and an empty target set; pointers
//! carry a meaningful target set and a top interval. Keeping both sides in
//! one value lets transfer functions stay ignorant of the static type.

use rustc_hash::FxHashSet;
use std::cmp::Ordering;

use super::region::{RegionId, RegionTable};
use crate::features::intervals::{Interval, Lattice};

/// Points-to component of a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// May point to any escaped region (maximal pointer uncertainty)
    Top,
    /// May point exactly to these regions
    Set(FxHashSet<RegionId>),
}

impl Targets {
    pub fn empty() -> Self {
        Targets::Set(FxHashSet::default())
    }

    pub fn single(r: RegionId) -> Self {
        let mut s = FxHashSet::default();
        s.insert(r);
        Targets::Set(s)
    }

    pub fn from_regions(rs: impl IntoIterator<Item = RegionId>) -> Self {
        Targets::Set(rs.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Targets::Set(s) if s.is_empty())
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Targets::Top)
    }

    /// Concrete target set, when bounded
    pub fn as_set(&self) -> Option<&FxHashSet<RegionId>> {
        match self {
            Targets::Top => None,
            Targets::Set(s) => Some(s),
        }
    }

    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Targets::Top, _) | (_, Targets::Top) => Targets::Top,
            (Targets::Set(a), Targets::Set(b)) => {
                let mut s = a.clone();
                s.extend(b.iter().copied());
                Targets::Set(s)
            }
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Targets::Top) => true,
            (Targets::Top, Targets::Set(_)) => false,
            (Targets::Set(a), Targets::Set(b)) => a.is_subset(b),
        }
    }

    /// Two pointer values may be equal if some target pair may denote the
    /// same object. Top stands for "any escaped region".
    pub fn may_equal(&self, other: &Self, table: &RegionTable) -> bool {
        match (self, other) {
            (Targets::Top, Targets::Top) => true,
            (Targets::Top, Targets::Set(s)) | (Targets::Set(s), Targets::Top) => {
                s.iter().any(|r| table.is_escaped(*r))
            }
            (Targets::Set(a), Targets::Set(b)) => a
                .iter()
                .any(|x| b.iter().any(|y| table.may_be_same_object(*x, *y))),
        }
    }

    /// Two pointer values are definitely equal only when both are the
    /// same single concrete (non-summary) cell.
    pub fn must_equal(&self, other: &Self, table: &RegionTable) -> bool {
        match (self, other) {
            (Targets::Set(a), Targets::Set(b)) => {
                a.len() == 1 && a == b && {
                    let r = *a.iter().next().expect("len checked");
                    !table.is_summary(r)
                }
            }
            _ => false,
        }
    }
}

/// Interval × points-to product value
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractValue {
    pub interval: Interval,
    pub targets: Targets,
}

impl AbstractValue {
    /// Integer constant
    pub fn constant(v: i64) -> Self {
        Self {
            interval: Interval::singleton(v),
            targets: Targets::empty(),
        }
    }

    /// Integer with a known range
    pub fn from_interval(interval: Interval) -> Self {
        Self {
            interval,
            targets: Targets::empty(),
        }
    }

    /// Pointer to exactly these regions (interval side is meaningless)
    pub fn pointer(targets: Targets) -> Self {
        Self {
            interval: Interval::top(),
            targets,
        }
    }

    /// Pointer to a single region
    pub fn pointer_to(r: RegionId) -> Self {
        Self::pointer(Targets::single(r))
    }

    /// Completely unknown value: any integer, any escaped target
    pub fn unknown() -> Self {
        Self {
            interval: Interval::top(),
            targets: Targets::Top,
        }
    }

    /// Unreachable value
    pub fn bottom() -> Self {
        Self {
            interval: Interval::Bottom,
            targets: Targets::empty(),
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.interval.is_bottom() && self.targets.is_empty()
    }

    pub fn join(&self, other: &Self) -> Self {
        Self {
            interval: self.interval.join(&other.interval),
            targets: self.targets.join(&other.targets),
        }
    }

    pub fn widen(&self, other: &Self) -> Self {
        Self {
            interval: self.interval.widen(&other.interval),
            // Points-to sets over a finite region universe need no
            // widening beyond join
            targets: self.targets.join(&other.targets),
        }
    }

    pub fn narrow(&self, other: &Self) -> Self {
        Self {
            interval: self.interval.narrow(&other.interval),
            targets: self.targets.clone(),
        }
    }

    pub fn leq(&self, other: &Self) -> bool {
        self.interval.leq(&other.interval) && self.targets.leq(&other.targets)
    }

    pub fn partial_cmp_lattice(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.leq(other) {
            Some(Ordering::Less)
        } else if other.leq(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}
