//! Typed statements and basic blocks of the CFG input contract.

use serde::{Deserialize, Serialize};

use super::expr::{Expr, Place};
use super::source::SourceLoc;

/// Dense basic-block identifier, unique within a function
pub type BlockId = u32;

/// The closed statement set the core supports.
///
/// A front end handing over anything else must lower it or wrap it in
/// `Unsupported`, which poisons only the enclosing function's summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `place = expr`
    Assign {
        place: Place,
        expr: Expr,
        loc: SourceLoc,
    },
    /// Two-way conditional; both edges refine the condition
    Branch {
        cond: Expr,
        then_block: BlockId,
        else_block: BlockId,
        loc: SourceLoc,
    },
    /// Unconditional edge (always the last statement of its block)
    Goto { target: BlockId },
    /// Call to a function defined in the program
    Call {
        dest: Option<Place>,
        callee: String,
        args: Vec<Expr>,
        loc: SourceLoc,
    },
    /// Acquire a declared resource (lock / OSEK GetResource)
    Acquire { resource: String, loc: SourceLoc },
    /// Release a declared resource
    Release { resource: String, loc: SourceLoc },
    /// Save-point (setjmp-style): flows through, binds `dest = 0` on the
    /// first arrival, and becomes a resume target for matching jumps
    SavePoint {
        env: String,
        dest: Place,
        loc: SourceLoc,
    },
    /// Non-local jump (longjmp-style): never returns normally
    Jump {
        env: String,
        payload: Expr,
        loc: SourceLoc,
    },
    /// Spawn a new thread context starting at `entry`
    Spawn { entry: String, loc: SourceLoc },
    /// User assertion checked against the abstract state
    Assert { pred: Expr, loc: SourceLoc },
    /// Return from the current function
    Return {
        value: Option<Expr>,
        loc: SourceLoc,
    },
    /// Construct outside the supported set; analyzed per the hard-error
    /// policy (function summary becomes top, the rest still runs)
    Unsupported { what: String, loc: SourceLoc },
}

impl Statement {
    /// Statements that terminate their block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Statement::Branch { .. }
                | Statement::Goto { .. }
                | Statement::Return { .. }
                | Statement::Jump { .. }
        )
    }

    /// Source location, if the statement carries one
    pub fn loc(&self) -> Option<&SourceLoc> {
        match self {
            Statement::Assign { loc, .. }
            | Statement::Branch { loc, .. }
            | Statement::Call { loc, .. }
            | Statement::Acquire { loc, .. }
            | Statement::Release { loc, .. }
            | Statement::SavePoint { loc, .. }
            | Statement::Jump { loc, .. }
            | Statement::Spawn { loc, .. }
            | Statement::Assert { loc, .. }
            | Statement::Return { loc, .. }
            | Statement::Unsupported { loc, .. } => Some(loc),
            Statement::Goto { .. } => None,
        }
    }
}

/// Ordered statement list with a dense id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub stmts: Vec<Statement>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            stmts: Vec::new(),
        }
    }

    /// Successor blocks named by the terminator (dynamic jump edges are
    /// added by the non-local control-flow handler, not here)
    pub fn successors(&self) -> Vec<BlockId> {
        match self.stmts.last() {
            Some(Statement::Branch {
                then_block,
                else_block,
                ..
            }) => vec![*then_block, *else_block],
            Some(Statement::Goto { target }) => vec![*target],
            Some(Statement::Return { .. }) | Some(Statement::Jump { .. }) => vec![],
            // Fall-through without explicit terminator: next block id
            Some(_) | None => vec![self.id + 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successors_branch() {
        let mut b = BasicBlock::new(0);
        b.stmts.push(Statement::Branch {
            cond: Expr::constant(1),
            then_block: 1,
            else_block: 2,
            loc: SourceLoc::unknown(),
        });
        assert_eq!(b.successors(), vec![1, 2]);
    }

    #[test]
    fn test_successors_fallthrough() {
        let mut b = BasicBlock::new(3);
        b.stmts.push(Statement::Assign {
            place: Place::var("x"),
            expr: Expr::constant(0),
            loc: SourceLoc::unknown(),
        });
        assert_eq!(b.successors(), vec![4]);
    }

    #[test]
    fn test_jump_terminates() {
        let mut b = BasicBlock::new(0);
        b.stmts.push(Statement::Jump {
            env: "env".into(),
            payload: Expr::constant(2),
            loc: SourceLoc::unknown(),
        });
        assert!(b.stmts[0].is_terminator());
        assert!(b.successors().is_empty());
    }
}
