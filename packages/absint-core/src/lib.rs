/*
 * absint-core - Sound Static Analyzer Core
 *
 * Abstract interpretation over a typed CFG input contract, built for
 * concurrent, pointer-heavy embedded C programs.
 *
 * Feature-First Architecture:
 * - shared/      : Input contract (Expr, Statement, Program, reports)
 * - features/    : Vertical slices (intervals → memory → locking →
 *                  scheduling → nonlocal → summaries → solver)
 * - config/      : Analysis options
 *
 * Guarantees:
 * - Soundness first: precision degrades toward Unknown, never toward a
 *   silent false negative
 * - Termination: widening/narrowing plus a hard iteration budget
 * - No source text handling: a front end lowers into shared::models
 */

#![allow(clippy::new_without_default)] // Default impl not always wanted
#![allow(clippy::too_many_arguments)] // Transfer plumbing needs the state
#![allow(clippy::collapsible_if)] // Readability over brevity
#![allow(clippy::match_like_matches_macro)] // Match for readability

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Analysis configuration
pub mod config;

/// Error types
pub mod errors;

/// Vertical feature slices
pub mod features;

/// Shared input contract and report models
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Public API Surface
// ═══════════════════════════════════════════════════════════════════════════

pub use config::AnalysisConfig;
pub use errors::{AnalysisError, Result};
pub use features::intervals::{Bound, Interval, Lattice};
pub use features::locking::{LockSet, RaceConfidence, RaceReport};
pub use features::memory::{AbstractStore, AbstractValue, RegionKind, RegionTable, Targets};
pub use features::scheduling::Scheduler;
pub use features::solver::{AnalysisReport, Analyzer};
pub use features::summaries::{Summary, SummaryStore};
pub use shared::models::{
    AssertionResult, BasicBlock, BinOpKind, BlockId, Diagnostic, DiagnosticKind, Expr, Function,
    FunctionBuilder, GlobalDecl, Param, Place, Program, ResourceDecl, SolverStats, SourceLoc,
    Statement, ThreadContext, Verdict,
};
