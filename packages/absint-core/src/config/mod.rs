//! Analysis configuration
//!
//! The named options the core honors (external option parsing is out of
//! scope; a CLI or test hands a filled-in `AnalysisConfig` over).

use serde::{Deserialize, Serialize};

/// Options controlling domains, interprocedural mode, and the scheduling
/// naming convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Enable the interval domain; when false every interval is pinned to
    /// top but points-to and race analysis keep running
    pub interval: bool,

    /// Summary-based interprocedural mode. Functions are analyzed
    /// independently with maximal parameter uncertainty and publish
    /// global read/write/escape summaries.
    pub modular: bool,

    /// Enable region overlap checks derived from pointer arithmetic and
    /// type-based field matching (ana.race.direct-arithmetic)
    pub race_direct_arithmetic: bool,

    /// Functions whose name starts with this prefix become Task entry
    /// points (osek.taskprefix)
    pub task_prefix: String,

    /// Functions whose name starts with this prefix become ISR entry
    /// points (osek.isrprefix)
    pub isr_prefix: String,

    /// Number of revisits of a merge point before widening kicks in
    pub widening_delay: usize,

    /// Hard iteration budget; exceeding it aborts with a conservative
    /// result rather than looping (termination itself comes from
    /// widening, the budget only caps pathological inputs)
    pub max_iterations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval: true,
            modular: false,
            race_direct_arithmetic: false,
            task_prefix: "task_".to_string(),
            isr_prefix: "isr_".to_string(),
            widening_delay: 4,
            max_iterations: 100_000,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, on: bool) -> Self {
        self.interval = on;
        self
    }

    pub fn with_modular(mut self, on: bool) -> Self {
        self.modular = on;
        self
    }

    pub fn with_direct_arithmetic(mut self, on: bool) -> Self {
        self.race_direct_arithmetic = on;
        self
    }

    pub fn with_prefixes(mut self, task: impl Into<String>, isr: impl Into<String>) -> Self {
        self.task_prefix = task.into();
        self.isr_prefix = isr.into();
        self
    }

    pub fn with_widening_delay(mut self, delay: usize) -> Self {
        self.widening_delay = delay;
        self
    }
}
