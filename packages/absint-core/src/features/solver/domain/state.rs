//! Per-point solver state: the product flowing along CFG edges.

use crate::features::locking::LockSet;
use crate::features::memory::{AbstractStore, RegionTable};

/// Everything the transfer functions read and update at one program
/// point: the abstract store, the held lockset, and whether more than
/// one context may already be running.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    pub store: AbstractStore,
    pub locks: LockSet,
    /// False only during the single-threaded prefix of the initial
    /// context, before the first spawn
    pub multithreaded: bool,
}

impl AnalysisState {
    pub fn new(multithreaded: bool) -> Self {
        Self {
            store: AbstractStore::new(),
            locks: LockSet::new(),
            multithreaded,
        }
    }

    /// Join at a merge point: store values join, locksets intersect
    /// (only locks held on every path are still definitely held).
    pub fn join_from(&mut self, other: &AnalysisState) -> bool {
        let mut changed = self.store.join_from(&other.store);
        changed |= self.locks.intersect(&other.locks);
        changed |= self.absorb_flags(other);
        changed
    }

    pub fn widen_from(&mut self, other: &AnalysisState) -> bool {
        let mut changed = self.store.widen_from(&other.store);
        changed |= self.locks.intersect(&other.locks);
        changed |= self.absorb_flags(other);
        changed
    }

    /// Descending pass: only the store narrows, locksets stay put
    pub fn narrow_from(&mut self, other: &AnalysisState) -> bool {
        self.store.narrow_from(&other.store)
    }

    fn absorb_flags(&mut self, other: &AnalysisState) -> bool {
        if other.multithreaded && !self.multithreaded {
            self.multithreaded = true;
            true
        } else {
            false
        }
    }

    /// Restrict the store to globally visible regions
    pub fn shared_store(&self, table: &RegionTable) -> AbstractStore {
        self.store.shared_part(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::memory::AbstractValue;

    #[test]
    fn test_join_intersects_locks() {
        let mut a = AnalysisState::new(false);
        let mut b = AnalysisState::new(false);
        let loc = crate::shared::models::SourceLoc::unknown();
        a.locks.acquire(0, "r1", &loc);
        a.locks.acquire(1, "r2", &loc);
        b.locks.acquire(0, "r1", &loc);
        assert!(a.join_from(&b));
        assert!(a.locks.holds(0));
        assert!(!a.locks.holds(1));
    }

    #[test]
    fn test_multithreaded_is_sticky() {
        let mut a = AnalysisState::new(false);
        let mut b = AnalysisState::new(true);
        b.store.set(0, AbstractValue::constant(1));
        assert!(a.join_from(&b));
        assert!(a.multithreaded);
        assert!(!a.join_from(&a.clone()));
    }
}
