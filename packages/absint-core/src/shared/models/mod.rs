//! Shared input model (single source of truth)
//!
//! The CFG contract the core consumes from a front end:
//! - Expr / Place: memory expressions with struct-typed field paths
//! - Statement / BasicBlock / Function / Program: typed CFG
//! - ThreadContext: the closed set of execution contexts
//! - Verdict / Diagnostic: records handed back to external consumers

pub mod context;
pub mod expr;
pub mod program;
pub mod report;
pub mod source;
pub mod stmt;

pub use context::ThreadContext;
pub use expr::{BinOpKind, Expr, Place};
pub use program::{Function, FunctionBuilder, GlobalDecl, Param, Program, ResourceDecl};
pub use report::{AssertionResult, Diagnostic, DiagnosticKind, SolverStats, Verdict};
pub use source::SourceLoc;
pub use stmt::{BasicBlock, BlockId, Statement};
