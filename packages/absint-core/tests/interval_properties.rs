//! Property-based checks for the interval domain.
//!
//! Invariants that must hold for all inputs:
//! - join is a commutative upper bound, meet a lower bound
//! - widening covers the join and narrowing stays between the operands
//! - branch refinement never drops a satisfying value
//! - decided comparisons agree with every concrete value pair

use absint_core::{BinOpKind, Interval, Lattice};
use proptest::prelude::*;

const COMPARISONS: [BinOpKind; 6] = [
    BinOpKind::Eq,
    BinOpKind::Ne,
    BinOpKind::Lt,
    BinOpKind::Le,
    BinOpKind::Gt,
    BinOpKind::Ge,
];

fn concrete(op: BinOpKind, v: i64, w: i64) -> bool {
    match op {
        BinOpKind::Eq => v == w,
        BinOpKind::Ne => v != w,
        BinOpKind::Lt => v < w,
        BinOpKind::Le => v <= w,
        BinOpKind::Gt => v > w,
        BinOpKind::Ge => v >= w,
        _ => unreachable!("not a comparison"),
    }
}

fn interval() -> impl Strategy<Value = Interval> {
    (-100i64..=100, -100i64..=100).prop_map(|(a, b)| Interval::new(a.min(b), a.max(b)))
}

proptest! {
    #[test]
    fn prop_join_commutes(a in interval(), b in interval()) {
        prop_assert_eq!(a.join(&b), b.join(&a));
    }

    #[test]
    fn prop_join_is_upper_bound(a in interval(), b in interval()) {
        let j = a.join(&b);
        prop_assert!(a.leq(&j));
        prop_assert!(b.leq(&j));
    }

    #[test]
    fn prop_meet_is_lower_bound(a in interval(), b in interval()) {
        let m = a.meet(&b);
        prop_assert!(m.leq(&a));
        prop_assert!(m.leq(&b));
    }

    #[test]
    fn prop_widen_covers_join(a in interval(), b in interval()) {
        prop_assert!(a.join(&b).leq(&a.widen(&b)));
    }

    #[test]
    fn prop_narrow_stays_between(a in interval(), b in interval()) {
        let widened = a.widen(&b);
        let narrowed = widened.narrow(&b);
        prop_assert!(b.leq(&narrowed));
        prop_assert!(narrowed.leq(&widened));
    }

    #[test]
    fn prop_refine_keeps_witnesses(
        a in interval(),
        b in interval(),
        v in -100i64..=100,
        w in -100i64..=100,
    ) {
        for op in COMPARISONS {
            if a.contains(v) && b.contains(w) && concrete(op, v, w) {
                prop_assert!(
                    a.refine(op, &b).contains(v),
                    "refine({:?}) dropped witness {} of {} vs {}",
                    op, v, a, b
                );
            }
        }
    }

    #[test]
    fn prop_decided_comparisons_agree_with_values(
        a in interval(),
        b in interval(),
        v in -100i64..=100,
        w in -100i64..=100,
    ) {
        for op in COMPARISONS {
            if let Some(decided) = a.compare(op, &b) {
                if a.contains(v) && b.contains(w) {
                    prop_assert_eq!(
                        concrete(op, v, w),
                        decided,
                        "{:?} decided {} for {} vs {}",
                        op, decided, a, b
                    );
                }
            }
        }
    }
}
