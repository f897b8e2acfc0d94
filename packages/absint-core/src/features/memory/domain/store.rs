//! The abstract store: region → abstract value.
//!
//! One store flows through every transfer function; the solver owns it
//! exclusively during a run and publishes immutable snapshots afterwards.
//! A region absent from the map has never been written on this path;
//! reading it yields the unknown value (uninitialized memory).

use rustc_hash::FxHashMap;

use super::abstract_value::AbstractValue;
use super::region::{RegionId, RegionTable};
use crate::features::intervals::Lattice;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractStore {
    values: FxHashMap<RegionId, AbstractValue>,
}

impl AbstractStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a region; unwritten regions read as unknown
    pub fn get(&self, r: RegionId) -> AbstractValue {
        self.values
            .get(&r)
            .cloned()
            .unwrap_or_else(AbstractValue::unknown)
    }

    pub fn get_if_written(&self, r: RegionId) -> Option<&AbstractValue> {
        self.values.get(&r)
    }

    /// Strong update: replaces the previous value. Only sound when the
    /// destination resolves to a single non-summary region.
    pub fn set(&mut self, r: RegionId, v: AbstractValue) {
        self.values.insert(r, v);
    }

    /// Weak update: the write may or may not hit this region, so the new
    /// value is joined with whatever was there (unknown if unwritten).
    pub fn weak_update(&mut self, r: RegionId, v: &AbstractValue) {
        let merged = self.get(r).join(v);
        self.values.insert(r, merged);
    }

    /// Accumulate a published value: the first publication is taken as
    /// is, later ones join. Unlike `weak_update`, a missing key means
    /// "never published", not "unknown".
    pub fn accumulate(&mut self, r: RegionId, v: &AbstractValue) {
        match self.values.get_mut(&r) {
            Some(cur) => {
                let joined = cur.join(v);
                *cur = joined;
            }
            None => {
                self.values.insert(r, v.clone());
            }
        }
    }

    /// Drop all knowledge about a region (conservative havoc)
    pub fn havoc(&mut self, r: RegionId) {
        self.values.insert(r, AbstractValue::unknown());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &AbstractValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Join another store into this one; true if anything grew
    pub fn join_from(&mut self, other: &AbstractStore) -> bool {
        let mut changed = false;
        for (r, v) in &other.values {
            match self.values.get_mut(r) {
                Some(cur) => {
                    let joined = cur.join(v);
                    if joined != *cur {
                        *cur = joined;
                        changed = true;
                    }
                }
                None => {
                    self.values.insert(*r, v.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Widening variant of `join_from`, applied at designated merge
    /// points once the revisit budget is spent
    pub fn widen_from(&mut self, other: &AbstractStore) -> bool {
        let mut changed = false;
        for (r, v) in &other.values {
            match self.values.get_mut(r) {
                Some(cur) => {
                    let widened = cur.widen(v);
                    if widened != *cur {
                        *cur = widened;
                        changed = true;
                    }
                }
                None => {
                    self.values.insert(*r, v.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// One descending pass after widening stabilized
    pub fn narrow_from(&mut self, other: &AbstractStore) -> bool {
        let mut changed = false;
        for (r, v) in &other.values {
            if let Some(cur) = self.values.get_mut(r) {
                let narrowed = cur.narrow(v);
                if narrowed != *cur {
                    *cur = narrowed;
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn leq(&self, other: &AbstractStore) -> bool {
        self.values.iter().all(|(r, v)| {
            other
                .values
                .get(r)
                .map(|o| v.leq(o))
                // Absent on the other side means unknown there
                .unwrap_or(true)
        })
    }

    /// Copy only the globally visible part of the store (used to seed
    /// another context's entry state)
    pub fn shared_part(&self, table: &RegionTable) -> AbstractStore {
        let values = self
            .values
            .iter()
            .filter(|(r, _)| table.is_shared(**r))
            .map(|(r, v)| (*r, v.clone()))
            .collect();
        AbstractStore { values }
    }

    /// Havoc every escaped region compatible with an unknown write
    pub fn havoc_escaped(&mut self, table: &RegionTable) {
        let escaped: Vec<RegionId> = self
            .values
            .keys()
            .copied()
            .filter(|r| table.is_escaped(*r))
            .collect();
        for r in escaped {
            self.havoc(r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::intervals::Interval;

    #[test]
    fn test_strong_vs_weak_update() {
        let mut s = AbstractStore::new();
        s.set(0, AbstractValue::constant(1));
        s.set(0, AbstractValue::constant(2));
        assert_eq!(s.get(0).interval, Interval::singleton(2));

        s.weak_update(0, &AbstractValue::constant(5));
        assert_eq!(s.get(0).interval, Interval::new(2, 5));
    }

    #[test]
    fn test_unwritten_reads_unknown() {
        let s = AbstractStore::new();
        assert!(s.get(42).interval.is_top());
    }

    #[test]
    fn test_join_from_reports_change() {
        let mut a = AbstractStore::new();
        a.set(0, AbstractValue::constant(1));
        let mut b = AbstractStore::new();
        b.set(0, AbstractValue::constant(3));
        assert!(a.join_from(&b));
        assert_eq!(a.get(0).interval, Interval::new(1, 3));
        // Joining again changes nothing
        assert!(!a.join_from(&b));
    }

    #[test]
    fn test_shared_part_filters_locals() {
        let mut t = RegionTable::new();
        let g = t.global("g");
        let z = t.stack("f", "z");
        let mut s = AbstractStore::new();
        s.set(g, AbstractValue::constant(1));
        s.set(z, AbstractValue::constant(2));
        let shared = s.shared_part(&t);
        assert!(shared.get_if_written(g).is_some());
        assert!(shared.get_if_written(z).is_none());
    }
}
