//! Race detector: post-processes access events after solving converged.
//!
//! A pair of accesses races when the regions may overlap, at least one
//! side writes, the contexts may run concurrently under their held
//! locksets, and the locksets share no resource. Each distinct source
//! location pair is reported once with a conservative confidence tag.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::domain::access::AccessEvent;
use super::super::domain::lockset::ResourceTable;
use crate::config::AnalysisConfig;
use crate::features::memory::RegionTable;
use crate::features::scheduling::Scheduler;
use crate::shared::models::{SourceLoc, ThreadContext};

/// How certain the detector is about a reported pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceConfidence {
    /// Both accesses hit the identical region
    Definite,
    /// Overlap only through unresolved aliasing
    Possible,
}

/// Structured race record for the external formatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceReport {
    pub first: SourceLoc,
    pub second: SourceLoc,
    pub first_region: String,
    pub second_region: String,
    pub first_ctx: ThreadContext,
    pub second_ctx: ThreadContext,
    pub confidence: RaceConfidence,
}

/// Pairwise detector over the collected event set
pub struct RaceDetector<'a> {
    pub regions: &'a RegionTable,
    pub resources: &'a ResourceTable,
    pub scheduler: &'a Scheduler,
    pub config: &'a AnalysisConfig,
}

impl<'a> RaceDetector<'a> {
    pub fn new(
        regions: &'a RegionTable,
        resources: &'a ResourceTable,
        scheduler: &'a Scheduler,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            regions,
            resources,
            scheduler,
            config,
        }
    }

    pub fn detect(&self, events: &[AccessEvent]) -> Vec<RaceReport> {
        let mut reported: FxHashSet<(SourceLoc, SourceLoc)> = FxHashSet::default();
        let mut races = Vec::new();

        for (i, a) in events.iter().enumerate() {
            for b in events.iter().skip(i + 1) {
                if let Some(report) = self.check_pair(a, b) {
                    let key = if report.first <= report.second {
                        (report.first.clone(), report.second.clone())
                    } else {
                        (report.second.clone(), report.first.clone())
                    };
                    if reported.insert(key) {
                        debug!(
                            first = %report.first,
                            second = %report.second,
                            confidence = ?report.confidence,
                            "data race detected"
                        );
                        races.push(report);
                    }
                }
            }
        }
        races
    }

    fn check_pair(&self, a: &AccessEvent, b: &AccessEvent) -> Option<RaceReport> {
        // (b) at least one write
        if !a.kind.is_write() && !b.kind.is_write() {
            return None;
        }
        // (a) overlapping regions
        if !self
            .regions
            .may_overlap(a.region, b.region, self.config.race_direct_arithmetic)
        {
            return None;
        }
        // (c) concurrently executable contexts
        if a.ctx == b.ctx {
            return None;
        }
        // The single-threaded prefix of main is ordered before every
        // spawned thread's execution
        if (a.before_spawn && matches!(a.ctx, ThreadContext::Main))
            || (b.before_spawn && matches!(b.ctx, ThreadContext::Main))
        {
            return None;
        }
        if !self.scheduler.concurrent_under_locks(
            &a.ctx,
            &a.locks,
            &b.ctx,
            &b.locks,
            self.resources,
        ) {
            return None;
        }
        // (d) disjoint locksets
        if a.locks.iter().any(|r| b.locks.contains(r)) {
            return None;
        }

        let confidence = if a.region == b.region {
            RaceConfidence::Definite
        } else {
            RaceConfidence::Possible
        };
        Some(RaceReport {
            first: a.loc.clone(),
            second: b.loc.clone(),
            first_region: self.regions.display(a.region),
            second_region: self.regions.display(b.region),
            first_ctx: a.ctx.clone(),
            second_ctx: b.ctx.clone(),
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::locking::domain::access::AccessKind;

    fn event(
        region: u32,
        kind: AccessKind,
        locks: Vec<u32>,
        ctx: ThreadContext,
        line: u32,
    ) -> AccessEvent {
        AccessEvent {
            region,
            kind,
            locks,
            ctx,
            loc: SourceLoc::new("main.c", line),
            before_spawn: false,
        }
    }

    fn thread(site: &str) -> ThreadContext {
        ThreadContext::Thread {
            spawn_site: site.into(),
        }
    }

    #[test]
    fn test_unprotected_write_write_races() {
        let mut regions = RegionTable::new();
        let g = regions.global("g");
        let resources = ResourceTable::new();
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default();
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let events = vec![
            event(g, AccessKind::Write, vec![], ThreadContext::Main, 10),
            event(g, AccessKind::Write, vec![], thread("t@1"), 20),
        ];
        let races = det.detect(&events);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].confidence, RaceConfidence::Definite);
    }

    #[test]
    fn test_common_lock_suppresses() {
        let mut regions = RegionTable::new();
        let g = regions.global("g");
        let mut resources = ResourceTable::new();
        let m = resources.declare("m", None);
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default();
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let events = vec![
            event(g, AccessKind::Write, vec![m], ThreadContext::Main, 10),
            event(g, AccessKind::Write, vec![m], thread("t@1"), 20),
        ];
        assert!(det.detect(&events).is_empty());
    }

    #[test]
    fn test_read_read_is_silent() {
        let mut regions = RegionTable::new();
        let g = regions.global("g");
        let resources = ResourceTable::new();
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default();
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let events = vec![
            event(g, AccessKind::Read, vec![], ThreadContext::Main, 10),
            event(g, AccessKind::Read, vec![], thread("t@1"), 20),
        ];
        assert!(det.detect(&events).is_empty());
    }

    #[test]
    fn test_pre_spawn_main_access_ordered() {
        let mut regions = RegionTable::new();
        let g = regions.global("g");
        let resources = ResourceTable::new();
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default();
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let mut a = event(g, AccessKind::Write, vec![], ThreadContext::Main, 5);
        a.before_spawn = true;
        let b = event(g, AccessKind::Write, vec![], thread("t@1"), 20);
        assert!(det.detect(&[a, b]).is_empty());
    }

    #[test]
    fn test_aliased_fields_race_as_possible() {
        let mut regions = RegionTable::new();
        let h1 = regions.opaque_site("main.c:23:getS", Some("S"));
        let direct = regions.field(h1, "S", "field");
        let h2 = regions.opaque_site("main.c:30:getT", Some("T"));
        let inner = regions.field(h2, "T", "s");
        let nested = regions.field(inner, "S", "field");

        let resources = ResourceTable::new();
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default().with_direct_arithmetic(true);
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let events = vec![
            event(direct, AccessKind::Write, vec![], thread("t_fun@23"), 23),
            event(nested, AccessKind::Write, vec![], ThreadContext::Main, 30),
        ];
        let races = det.detect(&events);
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].confidence, RaceConfidence::Possible);
    }

    #[test]
    fn test_ceiling_protected_pair_not_reported() {
        let mut regions = RegionTable::new();
        let x = regions.global("x");
        let mut resources = ResourceTable::new();
        let r1 = resources.declare("r1", Some(5));
        let r2 = resources.declare("r2", Some(5));
        let scheduler = Scheduler::default();
        let config = AnalysisConfig::default();
        let det = RaceDetector::new(&regions, &resources, &scheduler, &config);

        let i0 = ThreadContext::Isr {
            name: "i0".into(),
            priority: 4,
        };
        let t = ThreadContext::Task {
            name: "t".into(),
            priority: 1,
        };
        // Disjoint locksets, but both ceilings dominate the other context
        let events = vec![
            event(x, AccessKind::Write, vec![r1], i0, 30),
            event(x, AccessKind::Write, vec![r2], t, 40),
        ];
        assert!(det.detect(&events).is_empty());
    }
}
