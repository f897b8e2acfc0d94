//! Analyzer facade: the one entry point external callers use.
//!
//! Validates the program, enumerates contexts, iterates the per-context
//! solves against the shared global invariant until it stabilizes, runs
//! one recording pass for verdicts and access events, and hands the
//! collected events to the race detector.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, Result};
use crate::features::intervals::{Interval, Lattice};
use crate::features::locking::{RaceDetector, RaceReport};
use crate::features::memory::AbstractValue;
use crate::features::scheduling::Scheduler;
use crate::shared::models::{
    AssertionResult, Diagnostic, Program, SolverStats, Statement, ThreadContext, Verdict,
};

use super::super::domain::AnalysisState;
use super::super::infrastructure::SolverCore;

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Verdicts per assertion site, ordered by location
    pub assertions: Vec<AssertionResult>,
    pub races: Vec<RaceReport>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: SolverStats,
}

impl AnalysisReport {
    /// Verdict at a source line, for callers that key off locations
    pub fn verdict_at(&self, file: &str, line: u32) -> Option<Verdict> {
        self.assertions
            .iter()
            .find(|a| a.loc.file == file && a.loc.line == line)
            .map(|a| a.verdict)
    }

    /// JSON rendering for external tooling
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The analyzer: configure once, run per program
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnalysisConfig::default())
    }

    pub fn analyze(&self, program: &Program) -> Result<AnalysisReport> {
        validate(program)?;

        let mut core = SolverCore::new(program, self.config.clone());
        for r in &program.resources {
            core.resources.declare(&r.name, r.ceiling);
        }
        core.scheduler = Scheduler::from_program(program, &core.config);
        core.scheduler
            .compute_default_ceilings(program, &mut core.resources);

        // Globals with static initializers seed the invariant
        for g in &program.globals {
            let r = core.regions.global(&g.name);
            if let Some(v) = g.init {
                core.shared.set(r, AbstractValue::constant(v));
            }
        }

        let contexts: Vec<ThreadContext> = core.scheduler.contexts().to_vec();
        info!(
            functions = program.functions.len(),
            contexts = contexts.len(),
            modular = core.config.modular,
            "analysis started"
        );

        if core.config.modular {
            self.solve_summaries(&mut core)?;
        }
        let analyzed_any = self.solve_contexts(&mut core, &contexts)?;
        if !analyzed_any {
            return Err(AnalysisError::FunctionNotFound("main".to_string()));
        }

        // Recording pass over the stable invariant
        if core.config.modular {
            let mut entry_ctx: FxHashMap<String, ThreadContext> = FxHashMap::default();
            for ctx in &contexts {
                if let Some(name) = Scheduler::entry_function(ctx) {
                    entry_ctx.insert(name.to_string(), ctx.clone());
                }
            }
            for name in sorted_function_names(program) {
                let ctx = entry_ctx
                    .get(&name)
                    .cloned()
                    .unwrap_or(ThreadContext::Main);
                let st = entry_state(&mut core, &name, true);
                core.analyze_function(&name, st, &ctx, true)?;
            }
        } else {
            for ctx in &contexts {
                let Some(name) = context_entry(&core, ctx) else {
                    continue;
                };
                let st = entry_state(&mut core, &name, !matches!(ctx, ThreadContext::Main));
                core.analyze_function(&name, st, ctx, true)?;
            }
        }

        let detector =
            RaceDetector::new(&core.regions, &core.resources, &core.scheduler, &core.config);
        let races = detector.detect(&core.events);

        let mut assertions: Vec<AssertionResult> = core
            .verdicts
            .iter()
            .map(|(loc, v)| AssertionResult {
                loc: loc.clone(),
                verdict: *v,
            })
            .collect();
        assertions.sort_by(|a, b| a.loc.cmp(&b.loc));

        let mut stats = core.stats.clone();
        stats.iterations = core.iterations;
        stats.contexts = contexts.len();

        info!(
            assertions = assertions.len(),
            races = races.len(),
            iterations = stats.iterations,
            "analysis finished"
        );
        Ok(AnalysisReport {
            assertions,
            races,
            diagnostics: dedup_diagnostics(core.diagnostics),
            stats,
        })
    }

    /// Modular prepass: iterate per-function solves until every
    /// published summary and the shared invariant stop growing
    fn solve_summaries(&self, core: &mut SolverCore<'_>) -> Result<()> {
        let names = sorted_function_names(core.program);
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let mut changed = false;
            for name in &names {
                let st = entry_state(core, name, true);
                let res = core.analyze_function(name, st, &ThreadContext::Main, false)?;
                // Replacing lets a summary degraded by a not-yet-solved
                // callee recover; late rounds fall back to join-only so
                // the outer loop terminates
                changed |= if rounds > 8 {
                    core.summaries.publish(name.clone(), res.summary)
                } else {
                    core.summaries.replace(name.clone(), res.summary)
                };
            }
            let out = core.shared_out.clone();
            changed |= core.shared.join_from(&out);
            if !changed {
                return Ok(());
            }
        }
    }

    /// Round-robin over contexts until the shared invariant stabilizes
    fn solve_contexts(
        &self,
        core: &mut SolverCore<'_>,
        contexts: &[ThreadContext],
    ) -> Result<bool> {
        let mut analyzed_any = false;
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            for ctx in contexts {
                let Some(name) = context_entry(core, ctx) else {
                    continue;
                };
                analyzed_any = true;
                let st = entry_state(core, &name, !matches!(ctx, ThreadContext::Main));
                core.analyze_function(&name, st, ctx, false)?;
            }
            let out = core.shared_out.clone();
            // Late rounds widen the invariant so slowly growing globals
            // cannot stretch the round count
            let changed = if rounds > 8 {
                core.shared.widen_from(&out)
            } else {
                core.shared.join_from(&out)
            };
            if !changed || !analyzed_any {
                return Ok(analyzed_any);
            }
        }
    }
}

/// Entry function name of a context, if the program defines it
fn context_entry(core: &SolverCore<'_>, ctx: &ThreadContext) -> Option<String> {
    let name = Scheduler::entry_function(ctx)?;
    core.program.function(name).map(|f| f.name.clone())
}

/// Context entry state: the shared invariant plus maximally uncertain
/// parameters
fn entry_state(core: &mut SolverCore<'_>, name: &str, multithreaded: bool) -> AnalysisState {
    let mut st = AnalysisState::new(multithreaded);
    st.store = core.shared.clone();
    if let Some(f) = core.program.function(name) {
        for p in &f.params {
            let r = core.regions.stack(name, p.name.clone());
            let v = if p.is_pointer {
                AbstractValue::unknown()
            } else {
                AbstractValue::from_interval(Interval::top())
            };
            st.store.set(r, v);
        }
    }
    st
}

fn sorted_function_names(program: &Program) -> Vec<String> {
    let mut names: Vec<String> = program.functions.keys().cloned().collect();
    names.sort();
    names
}

fn dedup_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut out: Vec<Diagnostic> = Vec::with_capacity(diagnostics.len());
    for d in diagnostics {
        if !out.contains(&d) {
            out.push(d);
        }
    }
    out
}

/// Reject programs the solver cannot even walk: dangling CFG edges and
/// synchronization on undeclared resources
fn validate(program: &Program) -> Result<()> {
    for f in program.functions.values() {
        if f.block(f.entry).is_none() {
            return Err(AnalysisError::MissingBlock {
                function: f.name.clone(),
                block: f.entry,
            });
        }
        for b in &f.blocks {
            for succ in b.successors() {
                if f.block(succ).is_none() {
                    return Err(AnalysisError::MissingBlock {
                        function: f.name.clone(),
                        block: succ,
                    });
                }
            }
            for stmt in &b.stmts {
                if let Statement::Acquire { resource, .. } | Statement::Release { resource, .. } =
                    stmt
                {
                    if !program.resources.iter().any(|r| &r.name == resource) {
                        return Err(AnalysisError::UndeclaredResource(resource.clone()));
                    }
                }
            }
        }
    }
    Ok(())
}
