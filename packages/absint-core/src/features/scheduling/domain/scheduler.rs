//! Priority-ceiling scheduling model.
//!
//! Tasks and ISRs form a closed context set with static priorities. While
//! a resource with ceiling C is held, no context with priority ≤ C may
//! start or resume; acquiring conceptually raises the holder's effective
//! priority to C. This bounds the interleavings the race detector has to
//! consider: two accesses both protected by a dominating ceiling can
//! never interleave, even with disjoint locksets.

use rustc_hash::FxHashMap;

use crate::config::AnalysisConfig;
use crate::features::locking::domain::lockset::{ResourceId, ResourceTable};
use crate::shared::models::{Program, Statement, ThreadContext};

/// The closed set of execution contexts plus the ceiling relation
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    contexts: Vec<ThreadContext>,
}

impl Scheduler {
    /// Enumerate contexts: main, one per spawn site, and one Task/ISR per
    /// entry function matched by the configured name prefixes.
    pub fn from_program(program: &Program, config: &AnalysisConfig) -> Self {
        let mut contexts = vec![ThreadContext::Main];

        for f in program.functions.values() {
            for block in &f.blocks {
                for stmt in &block.stmts {
                    if let Statement::Spawn { entry, loc } = stmt {
                        contexts.push(ThreadContext::Thread {
                            spawn_site: format!("{}@{}", entry, loc),
                        });
                    }
                }
            }
        }

        for name in program.functions.keys() {
            let priority = program.priorities.get(name).copied().unwrap_or(0);
            if name.starts_with(&config.isr_prefix) && program.priorities.contains_key(name) {
                contexts.push(ThreadContext::Isr {
                    name: name.clone(),
                    priority,
                });
            } else if name.starts_with(&config.task_prefix) && program.priorities.contains_key(name)
            {
                contexts.push(ThreadContext::Task {
                    name: name.clone(),
                    priority,
                });
            }
        }

        contexts.sort();
        contexts.dedup();
        Self { contexts }
    }

    pub fn contexts(&self) -> &[ThreadContext] {
        &self.contexts
    }

    /// Entry function of a context, None for Main
    pub fn entry_function(ctx: &ThreadContext) -> Option<&str> {
        match ctx {
            ThreadContext::Main => Some("main"),
            ThreadContext::Thread { spawn_site } => spawn_site.split('@').next(),
            ThreadContext::Task { name, .. } | ThreadContext::Isr { name, .. } => Some(name),
        }
    }

    /// Fill in missing resource ceilings as the max priority over all
    /// contexts that acquire the resource (transitively through calls).
    pub fn compute_default_ceilings(&self, program: &Program, resources: &mut ResourceTable) {
        let mut max_acquirer: FxHashMap<ResourceId, u32> = FxHashMap::default();
        for ctx in &self.contexts {
            let Some(prio) = ctx.priority() else { continue };
            let Some(entry) = Self::entry_function(ctx) else {
                continue;
            };
            for r in acquired_resources(program, entry, resources) {
                let slot = max_acquirer.entry(r).or_insert(0);
                *slot = (*slot).max(prio);
            }
        }
        for (r, ceiling) in max_acquirer {
            resources.default_ceiling(r, ceiling);
        }
    }

    /// Effective priority of a context holding `locks`
    pub fn effective_priority(
        &self,
        ctx: &ThreadContext,
        locks: &[ResourceId],
        resources: &ResourceTable,
    ) -> Option<u32> {
        let base = ctx.priority()?;
        let ceiling = locks
            .iter()
            .filter_map(|r| resources.ceiling(*r))
            .max()
            .unwrap_or(0);
        Some(base.max(ceiling))
    }

    /// Whether `b` may start or resume while `a` sits at a point holding
    /// `locks_a` (priority-ceiling preemption test)
    pub fn may_preempt(
        &self,
        a: &ThreadContext,
        locks_a: &[ResourceId],
        b: &ThreadContext,
        resources: &ResourceTable,
    ) -> bool {
        match (self.effective_priority(a, locks_a, resources), b.priority()) {
            (Some(eff_a), Some(prio_b)) => prio_b > eff_a,
            // Plain threads have no priority order: anyone may interleave
            _ => true,
        }
    }

    /// Whether two accesses, performed in different contexts while holding
    /// the given locksets, may execute concurrently.
    pub fn concurrent_under_locks(
        &self,
        a: &ThreadContext,
        locks_a: &[ResourceId],
        b: &ThreadContext,
        locks_b: &[ResourceId],
        resources: &ResourceTable,
    ) -> bool {
        if a == b {
            return false;
        }
        match (a.is_prioritized(), b.is_prioritized()) {
            (true, true) => {
                self.may_preempt(a, locks_a, b, resources)
                    || self.may_preempt(b, locks_b, a, resources)
            }
            // Plain threads (and mixtures) are unordered
            _ => !(matches!(a, ThreadContext::Main) && matches!(b, ThreadContext::Main)),
        }
    }
}

/// Resources acquired anywhere in `entry` or its callees
fn acquired_resources(
    program: &Program,
    entry: &str,
    resources: &ResourceTable,
) -> Vec<ResourceId> {
    let mut seen_fns = vec![entry.to_string()];
    let mut queue = vec![entry.to_string()];
    let mut out = Vec::new();
    while let Some(name) = queue.pop() {
        let Some(f) = program.function(&name) else {
            continue;
        };
        for block in &f.blocks {
            for stmt in &block.stmts {
                match stmt {
                    Statement::Acquire { resource, .. } => {
                        if let Some(r) = resources.lookup(resource) {
                            if !out.contains(&r) {
                                out.push(r);
                            }
                        }
                    }
                    Statement::Call { callee, .. } => {
                        if !seen_fns.contains(callee) {
                            seen_fns.push(callee.clone());
                            queue.push(callee.clone());
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isr(name: &str, priority: u32) -> ThreadContext {
        ThreadContext::Isr {
            name: name.into(),
            priority,
        }
    }

    fn task(name: &str, priority: u32) -> ThreadContext {
        ThreadContext::Task {
            name: name.into(),
            priority,
        }
    }

    fn resources_with(rs: &[(&str, u32)]) -> ResourceTable {
        let mut t = ResourceTable::new();
        for (name, c) in rs {
            t.declare(*name, Some(*c));
        }
        t
    }

    #[test]
    fn test_higher_priority_preempts() {
        let s = Scheduler::default();
        let r = resources_with(&[]);
        assert!(s.may_preempt(&task("t", 1), &[], &isr("i", 5), &r));
        assert!(!s.may_preempt(&isr("i", 5), &[], &task("t", 1), &r));
    }

    #[test]
    fn test_ceiling_blocks_preemption() {
        let s = Scheduler::default();
        let r = resources_with(&[("r2", 5)]);
        let r2 = r.lookup("r2").unwrap();
        // Task at prio 1 holding r2 (ceiling 5) cannot be preempted by
        // an ISR at prio 5
        assert!(!s.may_preempt(&task("t", 1), &[r2], &isr("i", 5), &r));
        // but a prio-6 ISR still gets through
        assert!(s.may_preempt(&task("t", 1), &[r2], &isr("j", 6), &r));
    }

    #[test]
    fn test_concurrent_under_locks_symmetry() {
        let s = Scheduler::default();
        let r = resources_with(&[("r1", 5), ("r2", 5)]);
        let r1 = r.lookup("r1").unwrap();
        let r2 = r.lookup("r2").unwrap();
        let i0 = isr("i0", 4);
        let t = task("t", 1);
        // Both hold ceiling-5 resources: no interleaving possible
        assert!(!s.concurrent_under_locks(&t, &[r2], &i0, &[r1], &r));
        // Unprotected task access can be preempted by the ISR
        assert!(s.concurrent_under_locks(&t, &[], &i0, &[r1], &r));
    }

    #[test]
    fn test_plain_threads_always_concurrent() {
        let s = Scheduler::default();
        let r = ResourceTable::new();
        let main = ThreadContext::Main;
        let th = ThreadContext::Thread {
            spawn_site: "t_fun@main.c:29".into(),
        };
        assert!(s.concurrent_under_locks(&main, &[], &th, &[], &r));
        assert!(!s.concurrent_under_locks(&main, &[], &main, &[], &r));
    }
}
