//! Worklist fixpoint engine.
//!
//! Solves one function at a time over keys `(block, start_idx)`; the
//! non-zero start indices exist only for resumption points injected by
//! non-local jumps. Ascending iteration joins until the configured
//! revisit delay, then widens. The descending phase re-executes whole
//! sweeps and narrows each point against the join of all its incoming
//! edges (narrowing edge-by-edge would be unsound at merge points). A
//! final collection pass re-executes the stabilized entries to gather
//! exit states and, when recording, verdicts, access events and
//! diagnostics.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, Result};
use crate::features::locking::{AccessEvent, ResourceId, ResourceTable};
use crate::features::memory::{AbstractStore, AbstractValue, RegionId, RegionTable};
use crate::features::nonlocal::SavePointRegistry;
use crate::features::scheduling::Scheduler;
use crate::features::summaries::{Summary, SummaryStore};
use crate::shared::models::{
    BlockId, Diagnostic, Function, Program, SolverStats, SourceLoc, ThreadContext, Verdict,
};

use super::super::domain::AnalysisState;
use super::eval::Exec;
use super::transfer::Flow;

/// Program point within one function: block plus starting statement
type PointKey = (BlockId, usize);

/// Solver-wide mutable state shared by every frame of a run
pub struct SolverCore<'p> {
    pub program: &'p Program,
    pub config: AnalysisConfig,
    pub regions: RegionTable,
    pub resources: ResourceTable,
    pub scheduler: Scheduler,
    pub summaries: SummaryStore,
    pub savepoints: SavePointRegistry,
    /// Joined states pushed by non-local jumps, keyed by the resumption
    /// point (function, block, statement index)
    pub resumptions: FxHashMap<(String, BlockId, usize), AnalysisState>,
    /// Stable global invariant read at unprotected shared accesses
    pub shared: AbstractStore,
    /// Shared writes published during the current round
    pub shared_out: AbstractStore,
    /// Context and lockset of every published write, per shared region.
    /// Reads consult this to decide whether a concurrent writer can
    /// interleave under the locks currently held.
    pub shared_writers: FxHashMap<RegionId, Vec<(ThreadContext, Vec<ResourceId>)>>,
    pub events: Vec<AccessEvent>,
    pub diagnostics: Vec<Diagnostic>,
    pub verdicts: FxHashMap<SourceLoc, Verdict>,
    pub stats: SolverStats,
    pub iterations: usize,
    /// Call stack of functions currently being solved (recursion guard)
    pub active: Vec<String>,
}

/// Result of solving one frame
pub struct FrameResult {
    /// Join of the states at every reachable return (meaningful only
    /// when `returns` is set)
    pub state: AnalysisState,
    /// Join of all returned values
    pub ret: AbstractValue,
    /// Whether any normal exit is reachable
    pub returns: bool,
    pub summary: Summary,
}

enum BlockOutcome {
    Edges(Vec<(BlockId, AnalysisState)>),
    Returned(AnalysisState, AbstractValue),
    Stopped,
}

impl<'p> SolverCore<'p> {
    pub fn new(program: &'p Program, config: AnalysisConfig) -> Self {
        Self {
            program,
            config,
            regions: RegionTable::new(),
            resources: ResourceTable::new(),
            scheduler: Scheduler::default(),
            summaries: SummaryStore::new(),
            savepoints: SavePointRegistry::new(),
            resumptions: FxHashMap::default(),
            shared: AbstractStore::new(),
            shared_out: AbstractStore::new(),
            shared_writers: FxHashMap::default(),
            events: Vec::new(),
            diagnostics: Vec::new(),
            verdicts: FxHashMap::default(),
            stats: SolverStats::default(),
            iterations: 0,
            active: Vec::new(),
        }
    }

    /// Solve one function to its local fixpoint
    pub fn analyze_function(
        &mut self,
        name: &str,
        entry: AnalysisState,
        ctx: &ThreadContext,
        record: bool,
    ) -> Result<FrameResult> {
        let program: &'p Program = self.program;
        let func = program
            .function(name)
            .ok_or_else(|| AnalysisError::FunctionNotFound(name.to_string()))?;
        self.active.push(name.to_string());
        let result = self.run_frame(func, ctx, entry, record);
        self.active.pop();
        // The frame exits: its save points stop being jump targets
        self.savepoints.retire_frame(name);
        result
    }

    fn run_frame(
        &mut self,
        func: &Function,
        ctx: &ThreadContext,
        entry: AnalysisState,
        record: bool,
    ) -> Result<FrameResult> {
        let mut entries: FxHashMap<PointKey, AnalysisState> = FxHashMap::default();
        entries.insert((func.entry, 0), entry.clone());

        self.ascend(func, ctx, &mut entries)?;
        self.descend(func, ctx, &mut entries, &entry)?;

        // Collection pass over the stabilized entries
        let mut summary = Summary::empty();
        let mut keys: Vec<PointKey> = entries.keys().copied().collect();
        keys.sort_unstable();
        let mut exit: Option<AnalysisState> = None;
        let mut ret = AbstractValue::bottom();
        let mut returns = false;
        for key in keys {
            let state = entries[&key].clone();
            if let BlockOutcome::Returned(s, v) =
                self.run_block(func, ctx, key, state, &mut summary, record, true)?
            {
                returns = true;
                ret = ret.join(&v);
                match &mut exit {
                    Some(e) => {
                        e.join_from(&s);
                    }
                    None => exit = Some(s),
                }
            }
        }
        if returns {
            summary.ret = ret.clone();
        }
        debug!(
            function = %func.name,
            points = entries.len(),
            returns,
            "local fixpoint converged"
        );
        Ok(FrameResult {
            state: exit.unwrap_or_else(|| AnalysisState::new(false)),
            ret,
            returns,
            summary,
        })
    }

    /// Ascending phase: chaotic iteration with widening after the
    /// configured revisit delay
    fn ascend(
        &mut self,
        func: &Function,
        ctx: &ThreadContext,
        entries: &mut FxHashMap<PointKey, AnalysisState>,
    ) -> Result<()> {
        let mut summary = Summary::empty();
        let mut visits: FxHashMap<PointKey, usize> = FxHashMap::default();
        let mut work: VecDeque<PointKey> = VecDeque::new();
        work.push_back((func.entry, 0));
        loop {
            if work.is_empty() {
                self.absorb_resumptions(func, entries, &mut visits, &mut work);
                if work.is_empty() {
                    break;
                }
            }
            let key = work.pop_front().expect("checked non-empty");
            self.charge_iteration()?;

            let state = entries[&key].clone();
            if let BlockOutcome::Edges(edges) =
                self.run_block(func, ctx, key, state, &mut summary, false, false)?
            {
                for (b, s) in edges {
                    self.merge(entries, &mut visits, &mut work, (b, 0), s);
                }
            }
        }
        Ok(())
    }

    /// Descending phase: whole-function sweeps. Each point narrows
    /// against the join of every incoming edge plus external input (the
    /// frame entry and any resumptions).
    fn descend(
        &mut self,
        func: &Function,
        ctx: &ThreadContext,
        entries: &mut FxHashMap<PointKey, AnalysisState>,
        entry: &AnalysisState,
    ) -> Result<()> {
        let mut summary = Summary::empty();
        for _ in 0..=self.config.widening_delay {
            let mut keys: Vec<PointKey> = entries.keys().copied().collect();
            keys.sort_unstable();

            let mut incoming: FxHashMap<PointKey, AnalysisState> = FxHashMap::default();
            incoming.insert((func.entry, 0), entry.clone());
            for ((f, b, i), s) in &self.resumptions {
                if f == &func.name {
                    incoming.insert((*b, *i), s.clone());
                }
            }

            for key in &keys {
                self.charge_iteration()?;
                let state = entries[key].clone();
                if let BlockOutcome::Edges(edges) =
                    self.run_block(func, ctx, *key, state, &mut summary, false, false)?
                {
                    for (b, s) in edges {
                        match incoming.get_mut(&(b, 0)) {
                            Some(e) => {
                                e.join_from(&s);
                            }
                            None => {
                                incoming.insert((b, 0), s);
                            }
                        }
                    }
                }
            }

            let mut changed = false;
            for (key, inc) in &incoming {
                if let Some(cur) = entries.get_mut(key) {
                    changed |= cur.narrow_from(inc);
                }
            }
            if !changed {
                break;
            }
        }
        Ok(())
    }

    fn charge_iteration(&mut self) -> Result<()> {
        self.iterations += 1;
        if self.iterations > self.config.max_iterations {
            return Err(AnalysisError::BudgetExhausted(self.iterations));
        }
        self.stats.points_visited += 1;
        Ok(())
    }

    /// Merge an incoming state into a point, queueing it when it grew
    fn merge(
        &mut self,
        entries: &mut FxHashMap<PointKey, AnalysisState>,
        visits: &mut FxHashMap<PointKey, usize>,
        work: &mut VecDeque<PointKey>,
        key: PointKey,
        incoming: AnalysisState,
    ) {
        let changed = match entries.get_mut(&key) {
            Some(cur) => {
                let n = visits.entry(key).or_insert(0);
                *n += 1;
                if *n > self.config.widening_delay {
                    let c = cur.widen_from(&incoming);
                    if c {
                        self.stats.widenings += 1;
                    }
                    c
                } else {
                    cur.join_from(&incoming)
                }
            }
            None => {
                entries.insert(key, incoming);
                true
            }
        };
        if changed && !work.contains(&key) {
            work.push_back(key);
        }
    }

    /// Pull in states that jumps (possibly in callees) pushed toward
    /// this function's save-point continuations
    fn absorb_resumptions(
        &mut self,
        func: &Function,
        entries: &mut FxHashMap<PointKey, AnalysisState>,
        visits: &mut FxHashMap<PointKey, usize>,
        work: &mut VecDeque<PointKey>,
    ) {
        let pending: Vec<(PointKey, AnalysisState)> = self
            .resumptions
            .iter()
            .filter(|((f, _, _), _)| f == &func.name)
            .map(|((_, b, i), s)| ((*b, *i), s.clone()))
            .collect();
        for (key, s) in pending {
            self.merge(entries, visits, work, key, s);
        }
    }

    fn run_block(
        &mut self,
        func: &Function,
        ctx: &ThreadContext,
        key: PointKey,
        mut state: AnalysisState,
        summary: &mut Summary,
        record: bool,
        publish: bool,
    ) -> Result<BlockOutcome> {
        let Some(block) = func.block(key.0) else {
            return Err(AnalysisError::MissingBlock {
                function: func.name.clone(),
                block: key.0,
            });
        };
        let mut ex = Exec {
            core: self,
            summary,
            frame: func.name.clone(),
            ctx: ctx.clone(),
            record,
            publish,
        };
        for (idx, stmt) in block.stmts.iter().enumerate().skip(key.1) {
            match ex.transfer(&mut state, block.id, stmt, idx)? {
                Flow::Continue => {}
                Flow::Edges(es) => return Ok(BlockOutcome::Edges(es)),
                Flow::Returned(v) => return Ok(BlockOutcome::Returned(state, v)),
                Flow::Stopped => return Ok(BlockOutcome::Stopped),
            }
        }
        // Fell off the end: implicit fall-through edge
        let edges = block
            .successors()
            .into_iter()
            .map(|b| (b, state.clone()))
            .collect();
        Ok(BlockOutcome::Edges(edges))
    }
}
