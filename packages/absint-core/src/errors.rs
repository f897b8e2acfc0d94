//! Error types for absint-core
//!
//! Soundness-preserving imprecision is never an error: unresolved
//! aliasing, missing summaries, and protocol violations degrade the
//! result instead. Errors here are for malformed input the core cannot
//! analyze at all.

use thiserror::Error;

/// Main error type for analyzer operations
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Entry function missing from the program
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// Block referenced by an edge does not exist in its function
    #[error("Malformed CFG in {function}: missing block {block}")]
    MissingBlock { function: String, block: u32 },

    /// Resource used without a declaration
    #[error("Undeclared resource: {0}")]
    UndeclaredResource(String),

    /// Iteration budget exceeded; the partial result is conservative
    #[error("Iteration budget exhausted after {0} steps")]
    BudgetExhausted(usize),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
