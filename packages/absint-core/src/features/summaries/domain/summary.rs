//! Per-function effect summaries for modular interprocedural analysis.
//!
//! A summary names the global regions a function may read or write, the
//! regions reachable through its return value or output parameters, and
//! its abstract return value. It is built once the function's local
//! fixpoint stabilizes and only then published; while under construction
//! it is owned exclusively by the solver (never shared mutable).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::memory::{AbstractValue, RegionId};

/// Global-effect summary of one function
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Global regions the function may read
    pub reads: FxHashSet<RegionId>,
    /// Global regions the function may write
    pub writes: FxHashSet<RegionId>,
    /// Regions escaping via return value or output parameters
    pub escapes: FxHashSet<RegionId>,
    /// Abstract return value
    pub ret: AbstractValue,
    /// Degraded summary: any global may have been read or written
    /// (unsupported construct or unknown body)
    pub is_top: bool,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            reads: FxHashSet::default(),
            writes: FxHashSet::default(),
            escapes: FxHashSet::default(),
            ret: AbstractValue::unknown(),
            is_top: false,
        }
    }

    /// The conservative summary: everything may have happened
    pub fn top() -> Self {
        Self {
            is_top: true,
            ..Self::empty()
        }
    }

    pub fn record_read(&mut self, r: RegionId) {
        self.reads.insert(r);
    }

    pub fn record_write(&mut self, r: RegionId) {
        self.writes.insert(r);
    }

    pub fn record_escape(&mut self, r: RegionId) {
        self.escapes.insert(r);
    }

    pub fn may_write(&self, r: RegionId) -> bool {
        self.is_top || self.writes.contains(&r)
    }

    /// Join with a re-computed summary; true if anything grew.
    /// Summaries only ever grow, so callers re-queued on change converge.
    pub fn join_from(&mut self, other: &Summary) -> bool {
        let mut changed = false;
        if other.is_top && !self.is_top {
            self.is_top = true;
            changed = true;
        }
        for (mine, theirs) in [
            (&mut self.reads, &other.reads),
            (&mut self.writes, &other.writes),
            (&mut self.escapes, &other.escapes),
        ] {
            let before = mine.len();
            mine.extend(theirs.iter().copied());
            changed |= mine.len() != before;
        }
        let ret = self.ret.join(&other.ret);
        if ret != self.ret {
            self.ret = ret;
            changed = true;
        }
        changed
    }
}

/// Published summaries, keyed by function identity.
///
/// Read-mostly after publication; a summary present here is immutable
/// from the consumer's point of view (updates replace, never mutate in
/// place under a reader).
#[derive(Debug, Clone, Default)]
pub struct SummaryStore {
    published: FxHashMap<String, Summary>,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, function: &str) -> Option<&Summary> {
        self.published.get(function)
    }

    /// Replace the stored summary with a fresh recomputation; true if
    /// consumers need re-queueing. A summary degraded by a callee that
    /// had not published yet recovers here once the callee appears.
    pub fn replace(&mut self, function: impl Into<String>, summary: Summary) -> bool {
        let name = function.into();
        match self.published.get_mut(&name) {
            Some(existing) if *existing == summary => false,
            Some(existing) => {
                *existing = summary;
                true
            }
            None => {
                self.published.insert(name, summary);
                true
            }
        }
    }

    /// Publish (or widen) the summary for a function; true if consumers
    /// need re-queueing
    pub fn publish(&mut self, function: impl Into<String>, summary: Summary) -> bool {
        let name = function.into();
        match self.published.get_mut(&name) {
            Some(existing) => existing.join_from(&summary),
            None => {
                self.published.insert(name, summary);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.published.len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_grows_monotonically() {
        let mut a = Summary::empty();
        a.record_write(1);
        let mut b = Summary::empty();
        b.record_write(2);
        b.record_read(3);

        assert!(a.join_from(&b));
        assert!(a.may_write(1));
        assert!(a.may_write(2));
        assert!(a.reads.contains(&3));
        // Idempotent
        assert!(!a.join_from(&b));
    }

    #[test]
    fn test_top_absorbs() {
        let mut a = Summary::empty();
        assert!(a.join_from(&Summary::top()));
        assert!(a.is_top);
        assert!(a.may_write(999));
    }

    #[test]
    fn test_replace_recovers_from_degraded() {
        let mut store = SummaryStore::new();
        assert!(store.replace("f", Summary::top()));
        let mut s = Summary::empty();
        s.record_write(1);
        assert!(store.replace("f", s.clone()));
        assert!(!store.get("f").unwrap().is_top);
        // Same recomputation again: nothing to re-queue
        assert!(!store.replace("f", s));
    }

    #[test]
    fn test_publish_reports_change() {
        let mut store = SummaryStore::new();
        let mut s = Summary::empty();
        s.record_write(1);
        assert!(store.publish("f", s.clone()));
        assert!(!store.publish("f", s.clone()));
        s.record_write(2);
        assert!(store.publish("f", s));
    }
}
