//! Shared helpers for the integration suites: location and expression
//! shorthands so the program fixtures read close to the C they model.

#![allow(dead_code)]

use absint_core::{BinOpKind, Expr, Place, SourceLoc, Statement};

pub fn loc(line: u32) -> SourceLoc {
    SourceLoc::new("test.c", line)
}

pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Eq, lhs, rhs)
}

pub fn ne(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Ne, lhs, rhs)
}

pub fn lt(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Lt, lhs, rhs)
}

pub fn le(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Le, lhs, rhs)
}

pub fn gt(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Gt, lhs, rhs)
}

pub fn ge(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Ge, lhs, rhs)
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binop(BinOpKind::Add, lhs, rhs)
}

pub fn call(dest: Option<Place>, callee: &str, args: Vec<Expr>, line: u32) -> Statement {
    Statement::Call {
        dest,
        callee: callee.to_string(),
        args,
        loc: loc(line),
    }
}

pub fn spawn(entry: &str, line: u32) -> Statement {
    Statement::Spawn {
        entry: entry.to_string(),
        loc: loc(line),
    }
}
