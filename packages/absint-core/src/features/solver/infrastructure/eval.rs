//! Abstract expression evaluation and memory access.
//!
//! `Exec` is the per-frame execution handle the transfer functions run
//! on: it borrows the solver-wide tables plus the summary under
//! construction and knows which frame and context it evaluates in.
//! Reads and writes of shared regions are funneled through one place so
//! access events, summaries, and the published global invariant stay
//! consistent.

use crate::features::intervals::{Interval, Lattice};
use crate::features::locking::{AccessEvent, AccessKind};
use crate::features::memory::{AbstractValue, PlaceResolver, RegionId, Targets};
use crate::features::summaries::Summary;
use crate::shared::models::{BinOpKind, Expr, Place, SourceLoc, ThreadContext};

use super::super::domain::AnalysisState;
use super::fixpoint::SolverCore;

/// Execution handle for one frame of one context
pub struct Exec<'a, 'p> {
    pub core: &'a mut SolverCore<'p>,
    pub summary: &'a mut Summary,
    /// Function owning the local variables evaluated here
    pub frame: String,
    pub ctx: ThreadContext,
    /// True only during the reporting pass: verdicts, access events and
    /// diagnostics are emitted, never during ascending iteration
    pub record: bool,
    /// True only during the collection pass over stabilized states:
    /// shared writes reach the published global invariant
    pub publish: bool,
}

impl<'a, 'p> Exec<'a, 'p> {
    pub fn eval(&mut self, state: &mut AnalysisState, expr: &Expr, loc: &SourceLoc) -> AbstractValue {
        let mut v = self.eval_inner(state, expr, loc);
        if !self.core.config.interval {
            v.interval = Interval::top();
        }
        v
    }

    fn eval_inner(
        &mut self,
        state: &mut AnalysisState,
        expr: &Expr,
        loc: &SourceLoc,
    ) -> AbstractValue {
        match expr {
            Expr::Const(v) => AbstractValue::constant(*v),
            Expr::Place(p) => self.read_place(state, p, loc),
            Expr::AddrOf(p) => {
                let targets = self.resolve_place(state, p, loc);
                AbstractValue::pointer(targets)
            }
            Expr::BinOp { op, lhs, rhs } => {
                let a = self.eval(state, lhs, loc);
                let b = self.eval(state, rhs, loc);
                if op.is_comparison() {
                    AbstractValue::from_interval(Interval::truth(self.decide(*op, &a, &b)))
                } else {
                    let interval = match op {
                        BinOpKind::Add => a.interval.add(&b.interval),
                        BinOpKind::Sub => a.interval.sub(&b.interval),
                        BinOpKind::Mul => a.interval.mul(&b.interval),
                        _ => Interval::top(),
                    };
                    // Pointer arithmetic stays within the base object
                    AbstractValue {
                        interval,
                        targets: a.targets.join(&b.targets),
                    }
                }
            }
            Expr::OpaqueCall { callee, ret_struct } => {
                let site = format!("{}:{}", loc, callee);
                let r = self.core.regions.opaque_site(site, ret_struct.as_deref());
                AbstractValue::pointer_to(r)
            }
            Expr::Unknown => AbstractValue::unknown(),
        }
    }

    /// Regions a place may denote in the current frame
    pub fn resolve_place(
        &mut self,
        state: &mut AnalysisState,
        place: &Place,
        loc: &SourceLoc,
    ) -> Targets {
        // A place spine holds at most one dereference; evaluate its
        // pointer expression up front so the resolver callback needs no
        // re-entrant evaluation
        let deref_targets = spine_deref(place).map(|e| self.eval(state, e, loc).targets);
        let mut resolver = PlaceResolver::new(&mut self.core.regions, &self.frame);
        resolver.resolve(place, &mut |_, _| {
            deref_targets.clone().unwrap_or(Targets::Top)
        })
    }

    pub fn read_place(
        &mut self,
        state: &mut AnalysisState,
        place: &Place,
        loc: &SourceLoc,
    ) -> AbstractValue {
        let targets = self.resolve_place(state, place, loc);
        match targets {
            Targets::Top => AbstractValue::unknown(),
            Targets::Set(rs) => {
                if rs.is_empty() {
                    return AbstractValue::unknown();
                }
                let mut v = AbstractValue::bottom();
                for r in rs {
                    let mut cur = state.store.get(r);
                    if self.core.regions.is_shared(r) {
                        self.note_access(state, r, AccessKind::Read, loc);
                        // A concurrent write may have landed since
                        // function entry unless every publishing writer
                        // is excluded for the locks held here
                        if state.multithreaded && self.writer_may_interleave(state, r) {
                            if let Some(inv) = self.core.shared.get_if_written(r) {
                                cur = cur.join(inv);
                            }
                        }
                    }
                    v = v.join(&cur);
                }
                v
            }
        }
    }

    pub fn write_place(
        &mut self,
        state: &mut AnalysisState,
        place: &Place,
        value: AbstractValue,
        loc: &SourceLoc,
    ) {
        let targets = self.resolve_place(state, place, loc);
        self.write_to_targets(state, &targets, value, loc);
    }

    /// The store half of an assignment: strong update on a single
    /// concrete cell, weak update otherwise
    pub fn write_to_targets(
        &mut self,
        state: &mut AnalysisState,
        targets: &Targets,
        value: AbstractValue,
        loc: &SourceLoc,
    ) {
        match targets {
            Targets::Top => {
                // Unknown destination clobbers everything reachable, and
                // whatever was stored is now reachable from anywhere
                self.escape_value(&value);
                state.store.havoc_escaped(&self.core.regions);
            }
            Targets::Set(rs) => {
                let strong =
                    rs.len() == 1 && rs.iter().all(|r| !self.core.regions.is_summary(*r));
                for &r in rs {
                    if strong {
                        state.store.set(r, value.clone());
                    } else {
                        state.store.weak_update(r, &value);
                    }
                    if self.core.regions.is_shared(r) {
                        // A pointer stored into shared memory escapes
                        self.escape_value(&value);
                        if self.publish {
                            self.core.shared_out.accumulate(r, &value);
                            self.note_shared_writer(r, state);
                        }
                        self.note_access(state, r, AccessKind::Write, loc);
                    }
                }
            }
        }
    }

    /// Remember who published a write to `r` and under which locks
    fn note_shared_writer(&mut self, r: RegionId, state: &AnalysisState) {
        let entry = (self.ctx.clone(), state.locks.as_slice().to_vec());
        let writers = self.core.shared_writers.entry(r).or_default();
        if !writers.contains(&entry) {
            writers.push(entry);
        }
    }

    /// Whether some published writer of `r` can interleave with an
    /// access performed here: another context, no common lock, and the
    /// scheduler does not exclude the pair. Mirrors the race detector's
    /// pair test, so a read is privatized exactly when every racing
    /// writer is shut out.
    fn writer_may_interleave(&self, state: &AnalysisState, r: RegionId) -> bool {
        let Some(writers) = self.core.shared_writers.get(&r) else {
            return false;
        };
        writers.iter().any(|(ctx, locks)| {
            !locks.iter().any(|l| state.locks.holds(*l))
                && self.core.scheduler.concurrent_under_locks(
                    &self.ctx,
                    state.locks.as_slice(),
                    ctx,
                    locks,
                    &self.core.resources,
                )
        })
    }

    /// Mark every concrete target of a value as escaped
    pub fn escape_value(&mut self, value: &AbstractValue) {
        if let Targets::Set(ts) = &value.targets {
            for &t in ts {
                self.core.regions.mark_escaped(t);
            }
        }
    }

    /// Decide a comparison against the abstract operands.
    ///
    /// Pointer equality uses the region model (definite only for a
    /// shared single concrete cell, refutable only when no target pair
    /// may denote the same object); everything else is interval order.
    pub fn decide(&self, op: BinOpKind, a: &AbstractValue, b: &AbstractValue) -> Option<bool> {
        let pointerish = |v: &AbstractValue| !v.targets.is_empty();
        if matches!(op, BinOpKind::Eq | BinOpKind::Ne) && pointerish(a) && pointerish(b) {
            let eq = if a.targets.must_equal(&b.targets, &self.core.regions) {
                Some(true)
            } else if !a.targets.may_equal(&b.targets, &self.core.regions) {
                Some(false)
            } else {
                None
            };
            return match op {
                BinOpKind::Eq => eq,
                _ => eq.map(|x| !x),
            };
        }
        a.interval.compare(op, &b.interval)
    }

    fn note_access(
        &mut self,
        state: &AnalysisState,
        region: RegionId,
        kind: AccessKind,
        loc: &SourceLoc,
    ) {
        match kind {
            AccessKind::Read => self.summary.record_read(region),
            AccessKind::Write => self.summary.record_write(region),
        }
        if self.record {
            self.core.events.push(AccessEvent {
                region,
                kind,
                locks: state.locks.as_slice().to_vec(),
                ctx: self.ctx.clone(),
                loc: loc.clone(),
                before_spawn: !state.multithreaded,
            });
        }
    }
}

/// The single dereference on a place's spine, if any
fn spine_deref(place: &Place) -> Option<&Expr> {
    match place {
        Place::Deref(e) => Some(e),
        Place::Field { base, .. } => spine_deref(base),
        Place::Var(_) | Place::Global(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spine_deref_finds_innermost() {
        let p = Place::field(Place::deref(Expr::var("t")), "T", "s");
        assert!(matches!(spine_deref(&p), Some(Expr::Place(_))));
        assert!(spine_deref(&Place::var("x")).is_none());
    }
}
