//! Interval domain: integer ranges with widening and narrowing.
//!
//! An interval `[lo, hi]` bounds all possible values of an integer at a
//! program point. Bounds may be infinite; arithmetic saturates to the
//! unbounded side whenever overflow cannot be statically excluded.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::lattice::Lattice;
use crate::shared::models::BinOpKind;

/// One endpoint of an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    NegInf,
    Int(i64),
    PosInf,
}

impl Bound {
    fn as_int(self) -> Option<i64> {
        match self {
            Bound::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Lower-bound addition: overflow saturates toward -∞
    fn add_lo(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::Int(a), Bound::Int(b)) => a.checked_add(b).map_or(Bound::NegInf, Bound::Int),
        }
    }

    /// Upper-bound addition: overflow saturates toward +∞
    fn add_hi(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::Int(a), Bound::Int(b)) => a.checked_add(b).map_or(Bound::PosInf, Bound::Int),
        }
    }
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        use Bound::*;
        match (self, other) {
            (NegInf, NegInf) | (PosInf, PosInf) => Ordering::Equal,
            (NegInf, _) | (_, PosInf) => Ordering::Less,
            (PosInf, _) | (_, NegInf) => Ordering::Greater,
            (Int(a), Int(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::PosInf => write!(f, "+inf"),
            Bound::Int(v) => write!(f, "{}", v),
        }
    }
}

/// An integer interval, possibly unbounded on either side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// Empty set: unreachable value
    Bottom,
    /// All values `lo ≤ x ≤ hi`
    Range { lo: Bound, hi: Bound },
}

impl Interval {
    pub fn new(lo: i64, hi: i64) -> Self {
        if lo > hi {
            Interval::Bottom
        } else {
            Interval::Range {
                lo: Bound::Int(lo),
                hi: Bound::Int(hi),
            }
        }
    }

    pub fn range(lo: Bound, hi: Bound) -> Self {
        if lo > hi || lo == Bound::PosInf || hi == Bound::NegInf {
            Interval::Bottom
        } else {
            Interval::Range { lo, hi }
        }
    }

    pub fn singleton(v: i64) -> Self {
        Interval::new(v, v)
    }

    pub fn at_least(lo: i64) -> Self {
        Interval::Range {
            lo: Bound::Int(lo),
            hi: Bound::PosInf,
        }
    }

    pub fn at_most(hi: i64) -> Self {
        Interval::Range {
            lo: Bound::NegInf,
            hi: Bound::Int(hi),
        }
    }

    pub fn contains(&self, v: i64) -> bool {
        match self {
            Interval::Bottom => false,
            Interval::Range { lo, hi } => *lo <= Bound::Int(v) && Bound::Int(v) <= *hi,
        }
    }

    /// The single value, if the interval is a singleton
    pub fn as_singleton(&self) -> Option<i64> {
        match self {
            Interval::Range {
                lo: Bound::Int(a),
                hi: Bound::Int(b),
            } if a == b => Some(*a),
            _ => None,
        }
    }

    pub fn lower(&self) -> Option<i64> {
        match self {
            Interval::Range { lo, .. } => lo.as_int(),
            Interval::Bottom => None,
        }
    }

    pub fn upper(&self) -> Option<i64> {
        match self {
            Interval::Range { hi, .. } => hi.as_int(),
            Interval::Bottom => None,
        }
    }

    /// `[a,b] + [c,d] = [a+c, b+d]`, saturating to ±∞
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                Interval::Range {
                    lo: a.add_lo(*c),
                    hi: b.add_hi(*d),
                }
            }
        }
    }

    /// `[a,b] - [c,d] = [a-d, b-c]`
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// `-[a,b] = [-b,-a]`
    pub fn neg(&self) -> Self {
        match self {
            Interval::Bottom => Interval::Bottom,
            Interval::Range { lo, hi } => {
                let flip = |b: Bound, to: Bound| match b {
                    Bound::NegInf => Bound::PosInf,
                    Bound::PosInf => Bound::NegInf,
                    Bound::Int(v) => v.checked_neg().map_or(to, Bound::Int),
                };
                Interval::Range {
                    lo: flip(*hi, Bound::NegInf),
                    hi: flip(*lo, Bound::PosInf),
                }
            }
        }
    }

    /// Multiplication; any unbounded operand degrades to top
    pub fn mul(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                let (a, b, c, d) = match (a.as_int(), b.as_int(), c.as_int(), d.as_int()) {
                    (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
                    _ => return Interval::top(),
                };
                let products = [
                    a.checked_mul(c),
                    a.checked_mul(d),
                    b.checked_mul(c),
                    b.checked_mul(d),
                ];
                let mut lo = i64::MAX;
                let mut hi = i64::MIN;
                let mut valid = 0;
                for v in products.iter().flatten() {
                    lo = lo.min(*v);
                    hi = hi.max(*v);
                    valid += 1;
                }
                if valid < 4 {
                    Interval::top()
                } else {
                    Interval::new(lo, hi)
                }
            }
        }
    }

    /// Refine `self` assuming `self op other` holds.
    ///
    /// Applied on both branch edges (the false edge refines with the
    /// negated operator); required to prove branch-derived assertions.
    pub fn refine(&self, op: BinOpKind, other: &Self) -> Self {
        let (olo, ohi) = match other {
            Interval::Bottom => return Interval::Bottom,
            Interval::Range { lo, hi } => (*lo, *hi),
        };
        match op {
            BinOpKind::Eq => self.meet(other),
            BinOpKind::Ne => {
                // Only a singleton test can shave an endpoint
                if let Some(v) = other.as_singleton() {
                    match self {
                        Interval::Range { lo, hi } if *lo == Bound::Int(v) && *hi == Bound::Int(v) => {
                            Interval::Bottom
                        }
                        Interval::Range { lo, hi } if *lo == Bound::Int(v) => {
                            Interval::range(Bound::Int(v.saturating_add(1)), *hi)
                        }
                        Interval::Range { lo, hi } if *hi == Bound::Int(v) => {
                            Interval::range(*lo, Bound::Int(v.saturating_sub(1)))
                        }
                        _ => self.clone(),
                    }
                } else {
                    self.clone()
                }
            }
            // x < [c,d] ⇒ x ≤ d-1
            BinOpKind::Lt => match ohi {
                Bound::Int(d) => self.meet(&Interval::at_most(d.saturating_sub(1))),
                _ => self.clone(),
            },
            BinOpKind::Le => match ohi {
                Bound::Int(d) => self.meet(&Interval::at_most(d)),
                _ => self.clone(),
            },
            // x > [c,d] ⇒ x ≥ c+1
            BinOpKind::Gt => match olo {
                Bound::Int(c) => self.meet(&Interval::at_least(c.saturating_add(1))),
                _ => self.clone(),
            },
            BinOpKind::Ge => match olo {
                Bound::Int(c) => self.meet(&Interval::at_least(c)),
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Decide `self op other` when the intervals allow it.
    /// `Some(true)`: holds for every pair of values; `Some(false)`: fails
    /// for every pair; `None`: undecidable at this precision.
    pub fn compare(&self, op: BinOpKind, other: &Self) -> Option<bool> {
        if self.is_bottom() || other.is_bottom() {
            return None;
        }
        let (alo, ahi) = match self {
            Interval::Range { lo, hi } => (*lo, *hi),
            Interval::Bottom => unreachable!(),
        };
        let (blo, bhi) = match other {
            Interval::Range { lo, hi } => (*lo, *hi),
            Interval::Bottom => unreachable!(),
        };
        match op {
            BinOpKind::Eq => {
                if let (Some(a), Some(b)) = (self.as_singleton(), other.as_singleton()) {
                    Some(a == b)
                } else if self.meet(other).is_bottom() {
                    Some(false)
                } else {
                    None
                }
            }
            BinOpKind::Ne => self.compare(BinOpKind::Eq, other).map(|b| !b),
            BinOpKind::Lt => {
                if ahi < blo {
                    Some(true)
                } else if alo >= bhi {
                    Some(false)
                } else {
                    None
                }
            }
            BinOpKind::Le => {
                if ahi <= blo {
                    Some(true)
                } else if alo > bhi {
                    Some(false)
                } else {
                    None
                }
            }
            BinOpKind::Gt => other.compare(BinOpKind::Lt, self),
            BinOpKind::Ge => other.compare(BinOpKind::Le, self),
            _ => None,
        }
    }

    /// Boolean-valued result of a comparison as an interval
    pub fn truth(decided: Option<bool>) -> Self {
        match decided {
            Some(true) => Interval::singleton(1),
            Some(false) => Interval::singleton(0),
            None => Interval::new(0, 1),
        }
    }
}

impl Lattice for Interval {
    #[inline]
    fn bottom() -> Self {
        Interval::Bottom
    }

    #[inline]
    fn top() -> Self {
        Interval::Range {
            lo: Bound::NegInf,
            hi: Bound::PosInf,
        }
    }

    #[inline]
    fn is_bottom(&self) -> bool {
        matches!(self, Interval::Bottom)
    }

    #[inline]
    fn is_top(&self) -> bool {
        matches!(
            self,
            Interval::Range {
                lo: Bound::NegInf,
                hi: Bound::PosInf
            }
        )
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, x) | (x, Interval::Bottom) => x.clone(),
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                Interval::Range {
                    lo: (*a).min(*c),
                    hi: (*b).max(*d),
                }
            }
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                Interval::range((*a).max(*c), (*b).min(*d))
            }
        }
    }

    fn partial_cmp_lattice(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Interval::Bottom, Interval::Bottom) => Some(Ordering::Equal),
            (Interval::Bottom, _) => Some(Ordering::Less),
            (_, Interval::Bottom) => Some(Ordering::Greater),
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                if a == c && b == d {
                    Some(Ordering::Equal)
                } else if a >= c && b <= d {
                    Some(Ordering::Less)
                } else if a <= c && b >= d {
                    Some(Ordering::Greater)
                } else {
                    None
                }
            }
        }
    }

    /// A bound that moved since the last visit is extrapolated to its
    /// infinity; stable bounds are kept.
    fn widen(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, x) | (x, Interval::Bottom) => x.clone(),
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                let lo = if c < a { Bound::NegInf } else { *a };
                let hi = if d > b { Bound::PosInf } else { *b };
                Interval::Range { lo, hi }
            }
        }
    }

    /// An infinite bound is allowed to come back down; finite bounds stay.
    fn narrow(&self, other: &Self) -> Self {
        match (self, other) {
            (Interval::Bottom, _) | (_, Interval::Bottom) => Interval::Bottom,
            (Interval::Range { lo: a, hi: b }, Interval::Range { lo: c, hi: d }) => {
                let lo = if *a == Bound::NegInf { *c } else { *a };
                let hi = if *b == Bound::PosInf { *d } else { *b };
                Interval::range(lo, hi)
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Bottom => write!(f, "⊥"),
            Interval::Range { lo, hi } => write!(f, "[{},{}]", lo, hi),
        }
    }
}
