//! Statement transfer functions.
//!
//! Each statement maps an incoming `AnalysisState` to its outgoing
//! control flow. Branches return refined states per edge, returns and
//! non-local jumps terminate the block, everything else falls through.
//! Protocol violations and unsupported constructs degrade the state and
//! keep going; the solver never aborts over program behavior.

use crate::errors::Result;
use crate::features::intervals::Lattice;
use crate::features::locking::LockViolation;
use crate::features::memory::{AbstractValue, PlaceResolver, Targets};
use crate::features::nonlocal::SavePoint;
use crate::shared::models::{
    BinOpKind, BlockId, Diagnostic, DiagnosticKind, Expr, Place, SourceLoc, Statement, Verdict,
};

use super::super::domain::AnalysisState;
use super::eval::Exec;

/// Outgoing control flow of one statement
pub enum Flow {
    /// Fall through to the next statement
    Continue,
    /// Block terminated with explicit edges
    Edges(Vec<(BlockId, AnalysisState)>),
    /// Normal function exit with the returned value
    Returned(AbstractValue),
    /// No normal continuation (non-local jump, refuted assertion)
    Stopped,
}

impl<'a, 'p> Exec<'a, 'p> {
    pub fn transfer(
        &mut self,
        state: &mut AnalysisState,
        block: BlockId,
        stmt: &Statement,
        idx: usize,
    ) -> Result<Flow> {
        match stmt {
            Statement::Assign { place, expr, loc } => {
                let v = self.eval(state, expr, loc);
                self.write_place(state, place, v, loc);
                Ok(Flow::Continue)
            }

            Statement::Branch {
                cond,
                then_block,
                else_block,
                loc,
            } => {
                let mut edges = Vec::with_capacity(2);
                if let Some(s) = self.refine(state.clone(), cond, true, loc) {
                    edges.push((*then_block, s));
                }
                if let Some(s) = self.refine(state.clone(), cond, false, loc) {
                    edges.push((*else_block, s));
                }
                Ok(Flow::Edges(edges))
            }

            Statement::Goto { target } => Ok(Flow::Edges(vec![(*target, state.clone())])),

            Statement::Call {
                dest,
                callee,
                args,
                loc,
            } => self.call(state, dest.as_ref(), callee, args, loc),

            Statement::Acquire { resource, loc } => {
                if let Some(r) = self.core.resources.lookup(resource) {
                    if let Some(v) = state.locks.acquire(r, resource, loc) {
                        self.report_violation(&v);
                    }
                }
                Ok(Flow::Continue)
            }

            Statement::Release { resource, loc } => {
                if let Some(r) = self.core.resources.lookup(resource) {
                    if let Some(v) = state.locks.release(r, resource, loc) {
                        self.report_violation(&v);
                    }
                }
                Ok(Flow::Continue)
            }

            Statement::SavePoint { env, dest, loc } => {
                self.core.savepoints.register(SavePoint {
                    env: env.clone(),
                    function: self.frame.clone(),
                    block,
                    stmt_idx: idx,
                    dest: dest.clone(),
                });
                // First arrival binds zero; resumptions re-enter after
                // this statement with the jump payload already bound
                self.write_place(state, dest, AbstractValue::constant(0), loc);
                Ok(Flow::Continue)
            }

            Statement::Jump { env, payload, loc } => self.jump(state, env, payload, loc),

            Statement::Spawn { .. } => {
                state.multithreaded = true;
                Ok(Flow::Continue)
            }

            Statement::Assert { pred, loc } => {
                if self.record {
                    let verdict = match self.decide_pred(state, pred, loc) {
                        Some(true) => Verdict::Proven,
                        Some(false) => Verdict::Disproven,
                        None => Verdict::Unknown,
                    };
                    let slot = self.core.verdicts.entry(loc.clone()).or_insert(verdict);
                    *slot = slot.join(verdict);
                }
                // Execution only continues past an assertion that held
                match self.refine(state.clone(), pred, true, loc) {
                    Some(s) => {
                        *state = s;
                        Ok(Flow::Continue)
                    }
                    None => Ok(Flow::Stopped),
                }
            }

            Statement::Return { value, loc } => {
                let v = value
                    .as_ref()
                    .map(|e| self.eval(state, e, loc))
                    .unwrap_or_else(AbstractValue::unknown);
                Ok(Flow::Returned(v))
            }

            Statement::Unsupported { what, loc } => {
                if self.record {
                    self.core.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnsupportedConstruct,
                        loc.clone(),
                        format!("unsupported construct: {}", what),
                    ));
                }
                self.summary.is_top = true;
                state.store.havoc_escaped(&self.core.regions);
                Ok(Flow::Continue)
            }
        }
    }

    fn call(
        &mut self,
        state: &mut AnalysisState,
        dest: Option<&Place>,
        callee: &str,
        args: &[Expr],
        loc: &SourceLoc,
    ) -> Result<Flow> {
        let vals: Vec<AbstractValue> = args.iter().map(|a| self.eval(state, a, loc)).collect();

        if self.core.config.modular {
            self.call_by_summary(state, dest, callee, &vals, loc);
            return Ok(Flow::Continue);
        }

        let program = self.core.program;
        let recursive = self.core.active.iter().any(|f| f == callee);
        let Some(func) = program.function(callee) else {
            return Ok(self.call_opaque(state, dest, &vals, loc));
        };
        if recursive {
            return Ok(self.call_opaque(state, dest, &vals, loc));
        }

        let mut entry = state.clone();
        for (param, v) in func.params.iter().zip(vals.iter()) {
            let r = self.core.regions.stack(callee, param.name.clone());
            entry.store.set(r, v.clone());
        }
        let ctx = self.ctx.clone();
        let res = self.core.analyze_function(callee, entry, &ctx, self.record)?;
        if !res.returns {
            // The callee exits only through non-local jumps: everything
            // after this call site is unreachable
            return Ok(Flow::Stopped);
        }
        *state = res.state;
        if let Some(d) = dest {
            self.write_place(state, d, res.ret, loc);
        }
        Ok(Flow::Continue)
    }

    /// Callee with no analyzable body (external or recursive): anything
    /// reachable may have been read or written
    fn call_opaque(
        &mut self,
        state: &mut AnalysisState,
        dest: Option<&Place>,
        vals: &[AbstractValue],
        loc: &SourceLoc,
    ) -> Flow {
        for v in vals {
            self.escape_value(v);
        }
        state.store.havoc_escaped(&self.core.regions);
        if let Some(d) = dest {
            self.write_place(state, d, AbstractValue::unknown(), loc);
        }
        Flow::Continue
    }

    /// Modular call: apply the callee's published effect summary instead
    /// of descending into its body
    fn call_by_summary(
        &mut self,
        state: &mut AnalysisState,
        dest: Option<&Place>,
        callee: &str,
        vals: &[AbstractValue],
        loc: &SourceLoc,
    ) {
        for v in vals {
            self.escape_value(v);
        }
        match self.core.summaries.get(callee).cloned() {
            Some(s) if !s.is_top => {
                for &r in &s.writes {
                    state.store.havoc(r);
                }
                for &r in &s.escapes {
                    self.core.regions.mark_escaped(r);
                }
                self.summary.reads.extend(s.reads.iter().copied());
                self.summary.writes.extend(s.writes.iter().copied());
                self.summary.escapes.extend(s.escapes.iter().copied());
                if let Some(d) = dest {
                    self.write_place(state, d, s.ret.clone(), loc);
                }
            }
            _ => {
                state.store.havoc_escaped(&self.core.regions);
                self.summary.is_top = true;
                if let Some(d) = dest {
                    self.write_place(state, d, AbstractValue::unknown(), loc);
                }
            }
        }
    }

    fn jump(
        &mut self,
        state: &mut AnalysisState,
        env: &str,
        payload: &Expr,
        loc: &SourceLoc,
    ) -> Result<Flow> {
        let mut payload = self.eval(state, payload, loc);
        // A zero payload resumes as one
        if payload.interval.as_singleton() == Some(0) {
            payload = AbstractValue::constant(1);
        }
        let saves = self.core.savepoints.lookup(env).to_vec();
        if saves.is_empty() {
            if self.record {
                self.core.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DanglingJump,
                    loc.clone(),
                    format!("jump on {} with no live save point", env),
                ));
            }
            return Ok(Flow::Stopped);
        }
        for sp in saves {
            // The jump carries the current store, side effects intact;
            // the binding in the saver's frame receives the payload
            let mut resumed = state.clone();
            let targets = {
                let mut resolver = PlaceResolver::new(&mut self.core.regions, &sp.function);
                resolver.resolve(&sp.dest, &mut |_, _| Targets::Top)
            };
            self.write_to_targets(&mut resumed, &targets, payload.clone(), loc);
            let (block, idx) = sp.continuation();
            let key = (sp.function.clone(), block, idx);
            match self.core.resumptions.get_mut(&key) {
                Some(existing) => {
                    existing.join_from(&resumed);
                }
                None => {
                    self.core.resumptions.insert(key, resumed);
                }
            }
        }
        Ok(Flow::Stopped)
    }

    /// Refine a state under the assumption that `cond` evaluates to the
    /// given truth value; None means the edge is infeasible.
    pub fn refine(
        &mut self,
        mut state: AnalysisState,
        cond: &Expr,
        assume: bool,
        loc: &SourceLoc,
    ) -> Option<AnalysisState> {
        let zero = Expr::Const(0);
        let (op, lhs, rhs) = match cond {
            Expr::BinOp { op, lhs, rhs } if op.is_comparison() => (*op, lhs.as_ref(), rhs.as_ref()),
            other => (BinOpKind::Ne, other, &zero),
        };
        let op = if assume { op } else { op.negate().unwrap_or(op) };
        let a = self.eval(&mut state, lhs, loc);
        let b = self.eval(&mut state, rhs, loc);
        match self.decide(op, &a, &b) {
            Some(false) => return None,
            Some(true) => return Some(state),
            None => {}
        }
        if self.core.config.interval {
            self.refine_operand(&mut state, lhs, op, &b, loc)?;
            if let Some(sw) = op.swap() {
                self.refine_operand(&mut state, rhs, sw, &a, loc)?;
            }
        }
        Some(state)
    }

    /// Tighten the interval of a place operand assuming `expr op other`
    fn refine_operand(
        &mut self,
        state: &mut AnalysisState,
        expr: &Expr,
        op: BinOpKind,
        other: &AbstractValue,
        loc: &SourceLoc,
    ) -> Option<()> {
        let Expr::Place(place) = expr else {
            return Some(());
        };
        let Targets::Set(rs) = self.resolve_place(state, place, loc) else {
            return Some(());
        };
        // Refinement is a strong update: single concrete cells only
        if rs.len() != 1 {
            return Some(());
        }
        let r = *rs.iter().next().expect("len checked");
        if self.core.regions.is_summary(r) {
            return Some(());
        }
        let cur = state.store.get(r);
        let refined = cur.interval.refine(op, &other.interval);
        if refined.is_bottom() {
            return None;
        }
        state.store.set(
            r,
            AbstractValue {
                interval: refined,
                targets: cur.targets,
            },
        );
        Some(())
    }

    fn decide_pred(
        &mut self,
        state: &mut AnalysisState,
        pred: &Expr,
        loc: &SourceLoc,
    ) -> Option<bool> {
        let zero = Expr::Const(0);
        let (op, lhs, rhs) = match pred {
            Expr::BinOp { op, lhs, rhs } if op.is_comparison() => (*op, lhs.as_ref(), rhs.as_ref()),
            other => (BinOpKind::Ne, other, &zero),
        };
        let a = self.eval(state, lhs, loc);
        let b = self.eval(state, rhs, loc);
        self.decide(op, &a, &b)
    }

    fn report_violation(&mut self, v: &LockViolation) {
        if !self.record {
            return;
        }
        let message = match v {
            LockViolation::DoubleAcquire { resource, .. } => {
                format!("acquire of already held resource {}", resource)
            }
            LockViolation::ReleaseNotHeld { resource, .. } => {
                format!("release of resource {} which is not held", resource)
            }
            LockViolation::NonNestedRelease { resource, .. } => {
                format!("release of resource {} out of nesting order", resource)
            }
        };
        self.core.diagnostics.push(Diagnostic::new(
            DiagnosticKind::LockProtocolViolation,
            v.loc().clone(),
            message,
        ));
    }
}
