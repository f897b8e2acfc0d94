//! Diagnostic records and assertion verdicts exposed to external
//! formatters. The core only fills these in; rendering is out of scope.

use serde::{Deserialize, Serialize};

use super::source::SourceLoc;

/// Three-valued assertion outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Predicate holds on every abstract execution
    Proven,
    /// Predicate fails on every abstract execution
    Disproven,
    /// Neither provable nor refutable at this precision
    Unknown,
}

impl Verdict {
    /// Join of verdicts reaching the same assertion from different paths
    /// or contexts; disagreement degrades to Unknown.
    pub fn join(self, other: Verdict) -> Verdict {
        if self == other {
            self
        } else {
            Verdict::Unknown
        }
    }
}

/// Verdict for one assertion program point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub loc: SourceLoc,
    pub verdict: Verdict,
}

/// Non-race diagnostics emitted during solving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Acquire of a held resource / release of a non-held one /
    /// non-nested release order
    LockProtocolViolation,
    /// Jump with no live matching save point
    DanglingJump,
    /// Statement outside the supported set; the function's summary was
    /// degraded to top
    UnsupportedConstruct,
}

/// Structured record for the external formatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub loc: SourceLoc,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, loc: SourceLoc, message: impl Into<String>) -> Self {
        Self {
            kind,
            loc,
            message: message.into(),
        }
    }
}

/// Solver bookkeeping surfaced in the final report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    pub iterations: usize,
    pub points_visited: usize,
    pub widenings: usize,
    pub contexts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_join() {
        assert_eq!(Verdict::Proven.join(Verdict::Proven), Verdict::Proven);
        assert_eq!(Verdict::Proven.join(Verdict::Disproven), Verdict::Unknown);
        assert_eq!(Verdict::Unknown.join(Verdict::Proven), Verdict::Unknown);
    }
}
