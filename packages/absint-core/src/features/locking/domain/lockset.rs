//! LockSet domain: resources held at a program point.
//!
//! Held resources never shrink inside a critical section and must be
//! released in FIFO-nesting order. Protocol violations are reported and
//! the offending operation is treated as a no-op; the analysis never
//! aborts over them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::shared::models::SourceLoc;

/// Dense resource identifier
pub type ResourceId = u32;

/// Interning table for declared resources and their priority ceilings
#[derive(Debug, Default, Clone)]
pub struct ResourceTable {
    names: Vec<String>,
    ceilings: Vec<Option<u32>>,
    index: FxHashMap<String, ResourceId>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, ceiling: Option<u32>) -> ResourceId {
        let name = name.into();
        if let Some(&id) = self.index.get(&name) {
            if ceiling.is_some() {
                self.ceilings[id as usize] = ceiling;
            }
            return id;
        }
        let id = self.names.len() as ResourceId;
        self.names.push(name.clone());
        self.ceilings.push(ceiling);
        self.index.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<ResourceId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: ResourceId) -> &str {
        &self.names[id as usize]
    }

    pub fn ceiling(&self, id: ResourceId) -> Option<u32> {
        self.ceilings[id as usize]
    }

    /// Fill in missing ceilings (used once the acquirer priorities are
    /// known: ceiling defaults to the max priority of all acquirers)
    pub fn default_ceiling(&mut self, id: ResourceId, ceiling: u32) {
        let slot = &mut self.ceilings[id as usize];
        if slot.is_none() {
            *slot = Some(ceiling);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Lock protocol violations surfaced as diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockViolation {
    /// Acquire of a resource already held
    DoubleAcquire { resource: String, loc: SourceLoc },
    /// Release of a resource not currently held
    ReleaseNotHeld { resource: String, loc: SourceLoc },
    /// Release out of FIFO nesting order
    NonNestedRelease { resource: String, loc: SourceLoc },
}

impl LockViolation {
    pub fn loc(&self) -> &SourceLoc {
        match self {
            LockViolation::DoubleAcquire { loc, .. }
            | LockViolation::ReleaseNotHeld { loc, .. }
            | LockViolation::NonNestedRelease { loc, .. } => loc,
        }
    }
}

/// Acquisition-ordered set of held resources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSet {
    held: Vec<ResourceId>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holds(&self, r: ResourceId) -> bool {
        self.held.contains(&r)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.held.iter().copied()
    }

    pub fn as_slice(&self) -> &[ResourceId] {
        &self.held
    }

    /// Acquire; double acquires are no-ops reported to the caller
    pub fn acquire(
        &mut self,
        r: ResourceId,
        name: &str,
        loc: &SourceLoc,
    ) -> Option<LockViolation> {
        if self.holds(r) {
            return Some(LockViolation::DoubleAcquire {
                resource: name.to_string(),
                loc: loc.clone(),
            });
        }
        self.held.push(r);
        None
    }

    /// Release; must match the most recent acquisition (FIFO nesting)
    pub fn release(
        &mut self,
        r: ResourceId,
        name: &str,
        loc: &SourceLoc,
    ) -> Option<LockViolation> {
        match self.held.last() {
            Some(&top) if top == r => {
                self.held.pop();
                None
            }
            Some(_) if self.holds(r) => {
                // Out of order: release it anyway, conservatively
                self.held.retain(|&x| x != r);
                Some(LockViolation::NonNestedRelease {
                    resource: name.to_string(),
                    loc: loc.clone(),
                })
            }
            _ => Some(LockViolation::ReleaseNotHeld {
                resource: name.to_string(),
                loc: loc.clone(),
            }),
        }
    }

    /// Merge at a control-flow join: only resources held on every
    /// incoming path are still definitely held
    pub fn intersect(&mut self, other: &LockSet) -> bool {
        let before = self.held.len();
        self.held.retain(|r| other.holds(*r));
        self.held.len() != before
    }

    /// Resources held in both sets
    pub fn common(&self, other: &LockSet) -> Vec<ResourceId> {
        self.held
            .iter()
            .copied()
            .filter(|r| other.holds(*r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLoc {
        SourceLoc::unknown()
    }

    #[test]
    fn test_fifo_nesting_ok() {
        let mut t = ResourceTable::new();
        let a = t.declare("r1", None);
        let b = t.declare("r2", None);

        let mut ls = LockSet::new();
        assert!(ls.acquire(a, "r1", &loc()).is_none());
        assert!(ls.acquire(b, "r2", &loc()).is_none());
        assert!(ls.release(b, "r2", &loc()).is_none());
        assert!(ls.release(a, "r1", &loc()).is_none());
        assert!(ls.is_empty());
    }

    #[test]
    fn test_double_acquire_reported_and_ignored() {
        let mut t = ResourceTable::new();
        let a = t.declare("r1", None);
        let mut ls = LockSet::new();
        ls.acquire(a, "r1", &loc());
        let v = ls.acquire(a, "r1", &loc());
        assert!(matches!(v, Some(LockViolation::DoubleAcquire { .. })));
        assert!(ls.holds(a));
    }

    #[test]
    fn test_non_nested_release() {
        let mut t = ResourceTable::new();
        let a = t.declare("r1", None);
        let b = t.declare("r2", None);
        let mut ls = LockSet::new();
        ls.acquire(a, "r1", &loc());
        ls.acquire(b, "r2", &loc());
        let v = ls.release(a, "r1", &loc());
        assert!(matches!(v, Some(LockViolation::NonNestedRelease { .. })));
        // Conservatively released anyway
        assert!(!ls.holds(a));
        assert!(ls.holds(b));
    }

    #[test]
    fn test_release_not_held() {
        let mut t = ResourceTable::new();
        let a = t.declare("r1", None);
        let mut ls = LockSet::new();
        let v = ls.release(a, "r1", &loc());
        assert!(matches!(v, Some(LockViolation::ReleaseNotHeld { .. })));
    }

    #[test]
    fn test_join_intersects() {
        let mut t = ResourceTable::new();
        let a = t.declare("r1", None);
        let b = t.declare("r2", None);
        let mut x = LockSet::new();
        x.acquire(a, "r1", &loc());
        x.acquire(b, "r2", &loc());
        let mut y = LockSet::new();
        y.acquire(a, "r1", &loc());
        assert!(x.intersect(&y));
        assert!(x.holds(a));
        assert!(!x.holds(b));
    }
}
